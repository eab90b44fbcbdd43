use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoverError {
    #[error("Entrée invalide : {0}")]
    InvalidInput(String),

    #[error("Univers de couverture trop grand : {size} sous-ensembles (plafond {ceiling})")]
    UniverseTooLarge { size: u64, ceiling: u64 },

    #[error("Espace de grilles candidates trop grand : {size} grilles (plafond {ceiling})")]
    CandidateSpaceTooLarge { size: u64, ceiling: u64 },

    #[error("Solveur interrompu après {selected} grilles : {uncovered} sous-ensembles non couverts")]
    SolverAborted { selected: usize, uncovered: u64 },

    #[error("Validation exhaustive hors budget : {required} combinaisons (plafond {cap})")]
    ValidationExceededBudget { required: u64, cap: u64 },

    #[error("Calcul annulé")]
    Cancelled,

    #[error("Configuration invalide : {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoverError>;

pub(crate) fn invalid(msg: impl Into<String>) -> CoverError {
    CoverError::InvalidInput(msg.into())
}
