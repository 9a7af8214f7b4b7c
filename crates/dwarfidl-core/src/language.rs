//! Producer languages recognized from `DW_AT_language`.

use std::fmt;

use gimli::{constants, DwLang};

/// Source language of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language
{
    C,
    Cpp,
    Ada,
    Fortran,
    Cobol,
    Pascal,
    Modula,
    Java,
    Pli,
    ObjC,
    ObjCpp,
    D,
    Python,
    Upc,
}

impl Language
{
    /// Look up a raw `DW_LANG_*` code. Unlisted codes have no policy.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self>
    {
        let language = match DwLang(code) {
            constants::DW_LANG_C89 | constants::DW_LANG_C | constants::DW_LANG_C99 | constants::DW_LANG_C11 => {
                Language::C
            }
            constants::DW_LANG_C_plus_plus
            | constants::DW_LANG_C_plus_plus_03
            | constants::DW_LANG_C_plus_plus_11
            | constants::DW_LANG_C_plus_plus_14 => Language::Cpp,
            // 0x2e and 0x2f are Ada 2005 and Ada 2012
            constants::DW_LANG_Ada83 | constants::DW_LANG_Ada95 | DwLang(0x002e) | DwLang(0x002f) => Language::Ada,
            constants::DW_LANG_Fortran77
            | constants::DW_LANG_Fortran90
            | constants::DW_LANG_Fortran95
            | constants::DW_LANG_Fortran03
            | constants::DW_LANG_Fortran08 => Language::Fortran,
            constants::DW_LANG_Cobol74 | constants::DW_LANG_Cobol85 => Language::Cobol,
            constants::DW_LANG_Pascal83 => Language::Pascal,
            constants::DW_LANG_Modula2 | constants::DW_LANG_Modula3 => Language::Modula,
            constants::DW_LANG_Java => Language::Java,
            constants::DW_LANG_PLI => Language::Pli,
            constants::DW_LANG_ObjC => Language::ObjC,
            constants::DW_LANG_ObjC_plus_plus => Language::ObjCpp,
            constants::DW_LANG_D => Language::D,
            constants::DW_LANG_Python => Language::Python,
            constants::DW_LANG_UPC => Language::Upc,
            _ => return None,
        };
        Some(language)
    }

    /// Lower bound of a subrange that carries no `DW_AT_lower_bound`.
    #[must_use]
    pub fn default_lower_bound(self) -> i64
    {
        match self {
            Language::Ada | Language::Fortran | Language::Cobol | Language::Pascal | Language::Modula | Language::Pli => 1,
            Language::C
            | Language::Cpp
            | Language::Java
            | Language::ObjC
            | Language::ObjCpp
            | Language::D
            | Language::Python
            | Language::Upc => 0,
        }
    }
}

impl fmt::Display for Language
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Ada => "Ada",
            Language::Fortran => "Fortran",
            Language::Cobol => "COBOL",
            Language::Pascal => "Pascal",
            Language::Modula => "Modula",
            Language::Java => "Java",
            Language::Pli => "PL/I",
            Language::ObjC => "Objective-C",
            Language::ObjCpp => "Objective-C++",
            Language::D => "D",
            Language::Python => "Python",
            Language::Upc => "UPC",
        };
        write!(f, "{label}")
    }
}
