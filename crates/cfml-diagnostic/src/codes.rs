//! Error codes for CFML diagnostics.

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexer errors (E0001 - E0099)
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedComment,

    // Parser errors (E0100 - E0199)
    UnexpectedToken,
    ExpectedExpression,
    ExpectedIdentifier,
    ExpectedStatement,
    UnclosedDelimiter,
    MissingSemicolon,
    TrailingInput,

    // Validation errors (E0200 - E0299)
    UnknownAttribute,
    DuplicateAttribute,

    // Structural errors (E0300 - E0399)
    MalformedNode,
    MissingPropertyName,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "E0001",
            ErrorCode::UnterminatedString => "E0002",
            ErrorCode::UnterminatedComment => "E0003",

            // Parser
            ErrorCode::UnexpectedToken => "E0100",
            ErrorCode::ExpectedExpression => "E0101",
            ErrorCode::ExpectedIdentifier => "E0102",
            ErrorCode::ExpectedStatement => "E0103",
            ErrorCode::UnclosedDelimiter => "E0104",
            ErrorCode::MissingSemicolon => "E0105",
            ErrorCode::TrailingInput => "E0106",

            // Validation
            ErrorCode::UnknownAttribute => "E0200",
            ErrorCode::DuplicateAttribute => "E0201",

            // Structural
            ErrorCode::MalformedNode => "E0300",
            ErrorCode::MissingPropertyName => "E0301",
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "unexpected character in input",
            ErrorCode::UnterminatedString => "string literal is not terminated",
            ErrorCode::UnterminatedComment => "comment is not terminated",

            // Parser
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::ExpectedIdentifier => "expected an identifier",
            ErrorCode::ExpectedStatement => "expected a statement",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",
            ErrorCode::MissingSemicolon => "missing semicolon",
            ErrorCode::TrailingInput => "unexpected input after the end of the entry rule",

            // Validation
            ErrorCode::UnknownAttribute => "attribute is not recognized for this statement",
            ErrorCode::DuplicateAttribute => "attribute is specified more than once",

            // Structural
            ErrorCode::MalformedNode => "syntax tree node is missing a required part",
            ErrorCode::MissingPropertyName => "property declaration has no name",
        }
    }

    /// Get a suggested fix for the error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnterminatedString => Some("add the closing quote to terminate the string"),
            ErrorCode::UnterminatedComment => Some("add `*/` to close the comment"),
            ErrorCode::MissingSemicolon => Some("add `;` at the end of the statement"),
            ErrorCode::UnclosedDelimiter => Some("add the matching closing delimiter"),
            ErrorCode::DuplicateAttribute => Some("remove one of the duplicated attributes"),
            ErrorCode::MissingPropertyName => Some("add a `name` attribute or use `property type name`"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
