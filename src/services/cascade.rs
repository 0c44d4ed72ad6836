//! Cascade coordinator
//!
//! Runs the dependent writes of one lifecycle transition in a fixed order.
//! Committed steps are never rolled back: when a later step fails, the error
//! names the failed step and everything already committed so an operator can
//! reconcile. Wrap the whole cascade in a store transaction to get atomicity.

use std::future::Future;

use crate::error::{AppError, AppResult};

#[derive(Debug)]
pub struct Cascade {
    transition: &'static str,
    committed: Vec<&'static str>,
}

impl Cascade {
    pub fn begin(transition: &'static str) -> Self {
        Self {
            transition,
            committed: Vec::new(),
        }
    }

    pub fn committed(&self) -> &[&'static str] {
        &self.committed
    }

    /// Run one write; it counts as committed once it returns `Ok`
    pub async fn step<T, F>(&mut self, name: &'static str, write: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match write.await {
            Ok(value) => {
                self.committed.push(name);
                Ok(value)
            }
            Err(err) => Err(self.fail(name, err)),
        }
    }

    /// Run a conditional write; `false` means the observed state changed
    pub async fn conditional<F>(&mut self, name: &'static str, target: impl Into<String>, write: F) -> AppResult<()>
    where
        F: Future<Output = AppResult<bool>>,
    {
        match write.await {
            Ok(true) => {
                self.committed.push(name);
                Ok(())
            }
            Ok(false) => Err(self.fail(name, self.lost_race(target.into()))),
            Err(err) => Err(self.fail(name, err)),
        }
    }

    /// Conditional write returning the updated row; `None` means the observed state changed
    pub async fn conditional_row<T, F>(
        &mut self,
        name: &'static str,
        target: impl Into<String>,
        write: F,
    ) -> AppResult<T>
    where
        F: Future<Output = AppResult<Option<T>>>,
    {
        match write.await {
            Ok(Some(row)) => {
                self.committed.push(name);
                Ok(row)
            }
            Ok(None) => Err(self.fail(name, self.lost_race(target.into()))),
            Err(err) => Err(self.fail(name, err)),
        }
    }

    /// Close the cascade and return the committed steps
    pub fn finish(self) -> Vec<&'static str> {
        tracing::debug!("Cascade {} committed {:?}", self.transition, self.committed);
        self.committed
    }

    fn lost_race(&self, target: String) -> AppError {
        AppError::ConcurrentModification(format!("{} changed during {}", target, self.transition))
    }

    fn fail(&self, step: &'static str, cause: AppError) -> AppError {
        if self.committed.is_empty() {
            return cause;
        }

        tracing::error!(
            "Cascade {} stopped at {} after committing {:?}: {}",
            self.transition,
            step,
            self.committed,
            cause
        );
        AppError::CascadeIncomplete {
            transition: self.transition,
            failed_step: step,
            committed: self.committed.clone(),
            cause: Box::new(cause),
        }
    }
}
