use crate::environment::Recipe;
use crate::internal::InternalRecipe;
use crate::ModelError;
use std::fs;
use std::path::PathBuf;

/// Fetches a declarative recipe's definition and folds it into content.
///
/// Retrieval may perform I/O and blocks the caller; no cancellation channel
/// is provided, callers apply their own timeout.
pub trait RecipeRetriever: Send + Sync {
    fn retrieve(&self, recipe: &Recipe) -> Result<InternalRecipe, ModelError>;
}

/// Retriever for recipes that carry their definition inline.
///
/// A recipe with only a `location` fails here; factories that accept legacy
/// locations rewrite them to content before retrieval.
#[derive(Debug, Default)]
pub struct InlineRecipeRetriever;

impl RecipeRetriever for InlineRecipeRetriever {
    fn retrieve(&self, recipe: &Recipe) -> Result<InternalRecipe, ModelError> {
        match &recipe.content {
            Some(content) => Ok(InternalRecipe {
                kind: recipe.kind.clone(),
                content_type: recipe.content_type.clone(),
                content: content.clone(),
            }),
            None => match &recipe.location {
                Some(location) => Err(ModelError::RecipeUnretrievable(location.clone())),
                None => Err(ModelError::RecipeSourceMissing),
            },
        }
    }
}

/// Retriever that resolves a `location` as a path under a base directory.
pub struct FileRecipeRetriever {
    base_dir: PathBuf,
}

impl FileRecipeRetriever {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl RecipeRetriever for FileRecipeRetriever {
    fn retrieve(&self, recipe: &Recipe) -> Result<InternalRecipe, ModelError> {
        if let Some(content) = &recipe.content {
            return Ok(InternalRecipe {
                kind: recipe.kind.clone(),
                content_type: recipe.content_type.clone(),
                content: content.clone(),
            });
        }
        let location = recipe
            .location
            .as_ref()
            .ok_or(ModelError::RecipeSourceMissing)?;
        let path = self.base_dir.join(location);
        let content = fs::read_to_string(&path)
            .map_err(|_| ModelError::RecipeUnretrievable(location.clone()))?;
        Ok(InternalRecipe {
            kind: recipe.kind.clone(),
            content_type: recipe.content_type.clone(),
            content,
        })
    }
}
