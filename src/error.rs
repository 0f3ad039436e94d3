use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("No component definition named '{name}'")]
    DefinitionNotFound { name: String },

    #[error(
        "Cannot register definition '{name}': a definition with that name already exists and overriding is disabled"
    )]
    DefinitionOverride { name: String },

    #[error("Definition '{name}' is abstract and cannot be instantiated")]
    AbstractDefinition { name: String },

    #[error("Parent definition '{parent}' of '{name}' not found")]
    ParentNotFound { name: String, parent: String },

    #[error("Error creating component '{name}': {source}")]
    Creation {
        name: String,
        #[source]
        source: Box<ContextError>,
    },

    #[error("Component '{name}' does not provide the required capabilities {required}")]
    CapabilityMismatch { name: String, required: String },

    #[error("Circular placeholder reference '{placeholder}' in property definitions")]
    CircularPlaceholder { placeholder: String },

    #[error("Could not resolve placeholder '{placeholder}' in value \"{value}\"")]
    UnresolvablePlaceholder { placeholder: String, value: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Illegal context state: {message}")]
    IllegalState { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ContextError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::DefinitionNotFound { name: name.into() }
    }

    pub fn creation(name: impl Into<String>, source: ContextError) -> Self {
        Self::Creation {
            name: name.into(),
            source: Box::new(source),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
