//! The oracle is a black box that turns a prompt into text. Classification,
//! patch generation and reflection all go through [`Oracle`], so tests swap
//! in [`StaticOracle`] or [`FailingOracle`] instead of a network client.

pub mod error;
pub mod fake;
pub mod openai;

pub use error::OracleError;
pub use fake::{FailingOracle, StaticOracle};
pub use openai::OpenAiOracle;

pub trait Oracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

impl<T: Oracle + ?Sized> Oracle for &T {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).complete(prompt)
    }
}

impl<T: Oracle + ?Sized> Oracle for Box<T> {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).complete(prompt)
    }
}
