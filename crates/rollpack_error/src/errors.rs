use std::fmt::Display;

use crate::Error;

/// A collection of rollpack [Error].
///
/// Yeah, this is just a wrapper of `Vec<Error>` but with a few promises:
///
/// [Errors] is never empty. You could only construct a `Errors` from a `Error`.
#[derive(Debug)]
pub struct Errors(Vec<Error>);

impl Errors {
  pub fn new(err: Error) -> Self {
    Self(vec![err])
  }

  pub fn push(&mut self, error: Error) {
    self.0.push(error);
  }

  pub fn first(&self) -> &Error {
    &self.0[0]
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    false
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Error> {
    self.0.iter()
  }

  pub fn into_vec(self) -> Vec<Error> {
    self.0
  }

  /// Returns `None` if passing Vec<Error> is empty.
  pub fn from_vec(vec: Vec<Error>) -> Option<Self> {
    if vec.is_empty() {
      None
    } else {
      Some(Self(vec))
    }
  }
}

impl Extend<Error> for Errors {
  fn extend<T: IntoIterator<Item = Error>>(&mut self, iter: T) {
    self.0.extend(iter)
  }
}

impl From<Error> for Errors {
  fn from(error: Error) -> Self {
    Self(vec![error])
  }
}

impl From<std::io::Error> for Errors {
  fn from(error: std::io::Error) -> Self {
    Self(vec![Error::io_error(error)])
  }
}

impl Display for Errors {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (idx, err) in self.0.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      write!(f, "[{}] {}", err.kind.code(), err)?;
    }
    Ok(())
  }
}

impl std::error::Error for Errors {}
