pub mod classifier_trait;
pub mod factory;
pub mod xgboost;

pub use classifier_trait::ClassifierModel;
pub use xgboost::XGBoostClassifier;
