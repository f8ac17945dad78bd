use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E2xxx: semantic analysis (naming and typing)
/// - E9xxx: internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Type mismatch
    E2001,
    /// Unknown class in a type or `new` expression
    E2002,
    /// Unknown variable
    E2003,
    /// Wrong number of call arguments
    E2004,
    /// Unknown field
    E2005,
    /// Duplicate definition
    E2006,
    /// Unknown method
    E2007,
    /// Cyclic inheritance
    E2008,
    /// Class extends itself
    E2009,
    /// Unknown function
    E2010,
    /// Illegal overloading or override signature mismatch
    E2011,
    /// Array operation on a non-array
    E2012,
    /// Operands of `==` are not comparable
    E2013,
    /// Condition is not a boolean
    E2014,
    /// `this` outside a class
    E2015,
    /// Entry function missing or malformed
    E2016,

    /// Internal lowering error
    E9001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E2013 => "E2013",
            ErrorCode::E2014 => "E2014",
            ErrorCode::E2015 => "E2015",
            ErrorCode::E2016 => "E2016",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Whether this code marks a bug in the compiler rather than in the program.
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
