//! Error Code Registry for graph export passes
//!
//! Every diagnostic a pass can raise carries a stable numeric code so that
//! tooling and users can look up an explanation independent of the message.
//!
//! # Error Code Ranges
//!
//! - E5000-E5999: Code generation and optimization errors
//!   - E5600-E5699: Stateful operand splitting
//! - E9000-E9999: Internal compiler errors and assertions

use std::collections::HashMap;
use std::fmt;

/// A stateful operand shares its value but the value has no defining operation
pub const SPLIT_MISSING_PRODUCER: u16 = 5601;

/// A stateful operand shares its value and the producer cannot be cloned
pub const SPLIT_UNCLONABLE_PRODUCER: u16 = 5602;

/// A stateful operand index is past the end of the operand list
pub const SPLIT_OPERAND_OUT_OF_RANGE: u16 = 5603;

/// IR failed structural validation after a pass
pub const INVALID_IR: u16 = 9001;

/// A matched producer chain could not be cloned into place
pub const SPLIT_REWRITE_FAILED: u16 = 9002;

/// Error code struct containing the numeric code and human-readable description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// The numeric error code (e.g., 5601)
    pub code: u16,
    /// Human-readable error category
    pub category: &'static str,
    /// Brief description of what this error means
    pub description: &'static str,
    /// Optional help text with suggestions for fixing the error
    pub help: Option<&'static str>,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(
        code: u16,
        category: &'static str,
        description: &'static str,
        help: Option<&'static str>,
    ) -> Self {
        Self {
            code,
            category,
            description,
            help,
        }
    }

    /// Format the error code as "E{code:04}" (e.g., "E5601")
    pub fn format_code(&self) -> String {
        format!("E{:04}", self.code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {}",
            self.format_code(),
            self.category,
            self.description
        )
    }
}

/// Registry of all known error codes
#[derive(Debug)]
pub struct ErrorCodeRegistry {
    codes: HashMap<u16, ErrorCode>,
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCodeRegistry {
    /// Create a registry with every known code
    pub fn new() -> Self {
        let mut registry = Self {
            codes: HashMap::new(),
        };
        registry.register_all_codes();
        registry
    }

    /// Get an error code by number
    pub fn get(&self, code: u16) -> Option<&ErrorCode> {
        self.codes.get(&code)
    }

    /// Get an error code by its string form ("E5601")
    pub fn get_by_string(&self, code_str: &str) -> Option<&ErrorCode> {
        parse_error_code(code_str).and_then(|code| self.get(code))
    }

    fn register(&mut self, error_code: ErrorCode) {
        self.codes.insert(error_code.code, error_code);
    }

    fn register_all_codes(&mut self) {
        self.register(ErrorCode::new(
            SPLIT_MISSING_PRODUCER,
            "Stateful Operands",
            "Shared stateful operand has no defining operation",
            Some("a block or function parameter cannot be duplicated; pass a distinct value to each stateful operand"),
        ));
        self.register(ErrorCode::new(
            SPLIT_UNCLONABLE_PRODUCER,
            "Stateful Operands",
            "Shared stateful operand has a producer that cannot be cloned",
            Some("only constants and dequantized constants can be duplicated; give each stateful operand its own producer"),
        ));
        self.register(ErrorCode::new(
            SPLIT_OPERAND_OUT_OF_RANGE,
            "Stateful Operands",
            "Stateful operand index is out of range",
            Some("check the stateful operand table for this operation"),
        ));
        self.register(ErrorCode::new(
            INVALID_IR,
            "Internal",
            "IR failed validation",
            None,
        ));
        self.register(ErrorCode::new(
            SPLIT_REWRITE_FAILED,
            "Internal",
            "Cloning a matched producer chain failed",
            Some("please report this together with the input module"),
        ));
    }

    /// All codes in `start..=end`, sorted
    pub fn get_range(&self, start: u16, end: u16) -> Vec<&ErrorCode> {
        let mut codes: Vec<&ErrorCode> = self
            .codes
            .values()
            .filter(|c| c.code >= start && c.code <= end)
            .collect();
        codes.sort_by_key(|c| c.code);
        codes
    }

    /// Codes raised while splitting stateful operands
    pub fn get_split_errors(&self) -> Vec<&ErrorCode> {
        self.get_range(5600, 5699)
    }

    /// Check whether a code is registered
    pub fn is_valid_code(&self, code: u16) -> bool {
        self.codes.contains_key(&code)
    }
}

static REGISTRY: std::sync::OnceLock<ErrorCodeRegistry> = std::sync::OnceLock::new();

/// Get the global error code registry
pub fn error_registry() -> &'static ErrorCodeRegistry {
    REGISTRY.get_or_init(ErrorCodeRegistry::new)
}

/// Look up an error code in the global registry
pub fn get_error_code(code: u16) -> Option<&'static ErrorCode> {
    error_registry().get(code)
}

/// Format a numeric code as "E{code:04}"
pub fn format_error_code(code: u16) -> String {
    format!("E{:04}", code)
}

/// Parse "E5601" into 5601
pub fn parse_error_code(code_str: &str) -> Option<u16> {
    code_str
        .strip_prefix('E')
        .filter(|digits| digits.len() == 4)
        .and_then(|digits| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_functionality() {
        let registry = ErrorCodeRegistry::new();

        let code = registry.get(SPLIT_MISSING_PRODUCER).unwrap();
        assert_eq!(code.format_code(), "E5601");
        assert!(code.help.is_some());

        let by_string = registry.get_by_string("E5602").unwrap();
        assert_eq!(by_string.code, SPLIT_UNCLONABLE_PRODUCER);

        assert!(registry.get(65535).is_none());
        assert!(registry.get_by_string("INVALID").is_none());
    }

    #[test]
    fn test_split_error_range() {
        let registry = error_registry();
        let codes: Vec<u16> = registry.get_split_errors().iter().map(|c| c.code).collect();
        assert_eq!(codes, vec![5601, 5602, 5603]);
        assert!(std::ptr::eq(registry, error_registry()));

        let internal: Vec<u16> = registry.get_range(9000, 9999).iter().map(|c| c.code).collect();
        assert_eq!(internal, vec![INVALID_IR, SPLIT_REWRITE_FAILED]);
    }

    #[test]
    fn test_helper_functions() {
        assert_eq!(format_error_code(5601), "E5601");
        assert_eq!(format_error_code(42), "E0042");

        assert_eq!(parse_error_code("E5603"), Some(5603));
        assert_eq!(parse_error_code("5603"), None);
        assert_eq!(parse_error_code("E56"), None);

        let code = get_error_code(SPLIT_OPERAND_OUT_OF_RANGE).unwrap();
        assert_eq!(code.to_string(), "E5603 [Stateful Operands]: Stateful operand index is out of range");
    }
}
