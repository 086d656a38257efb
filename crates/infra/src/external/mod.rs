//! External service clients/adapters.

pub mod ecoscore;

pub use ecoscore::{
    EcoGrade, EcoScoreClient, EnrichmentError, FixedEcoScore, KeyedEcoScore, OpenFoodFactsClient,
    UnavailableEcoScore,
};
