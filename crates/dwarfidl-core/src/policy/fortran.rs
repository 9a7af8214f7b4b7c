//! Fortran producers: arrays are one-based unless a lower bound is given.

use crate::language::Language;
use crate::policy::TypePolicy;

#[derive(Debug, Clone, Copy)]
pub struct FortranPolicy
{
    version: u16,
}

impl FortranPolicy
{
    #[must_use]
    pub fn new(version: u16) -> Self
    {
        Self { version }
    }
}

impl TypePolicy for FortranPolicy
{
    fn version(&self) -> u16
    {
        self.version
    }

    fn language(&self) -> Language
    {
        Language::Fortran
    }

    fn default_lower_bound(&self) -> i64
    {
        1
    }
}
