// Parser safety limits
//
// Bounds the work a single source file can cause:
// - lexer: input size, token count, identifier/string/comment length
// - parser: statement nesting and expression nesting
// - ast: total arena size
//
// Every limit has a permissive default and can be overridden from the
// [limits] table of project.toml

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Resource limits shared by the lexer, the grouping layer and the parser
#[derive(Debug, Clone)]
pub struct CompilerLimits {
    // Lexer limits
    pub max_input_size: usize,        // Maximum source file size in bytes
    pub max_token_count: usize,       // Maximum number of flat tokens per file
    pub max_identifier_length: usize, // Maximum identifier length in bytes
    pub max_string_length: usize,     // Maximum string literal length in bytes
    pub max_comment_length: usize,    // Maximum comment length in bytes

    // Parser limits
    pub max_nesting_depth: usize, // Maximum statement nesting depth
    pub max_expr_depth: usize,    // Maximum expression recursion depth

    // AST limits
    pub max_ast_nodes: usize, // Maximum arena nodes per file
}

impl Default for CompilerLimits {
    fn default() -> Self {
        Self {
            max_input_size: 10_000_000,    // 10 MB
            max_token_count: 1_000_000,    // 1M tokens
            max_identifier_length: 1_000,  // 1k bytes
            max_string_length: 1_000_000,  // 1 MB
            max_comment_length: 100_000,   // 100k bytes
            max_nesting_depth: 256,
            max_expr_depth: 256,
            max_ast_nodes: 1_000_000, // 1M nodes
        }
    }
}

impl CompilerLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load limits from project.toml, falling back to defaults
    ///
    /// Returns error only if TOML is malformed, not if file is missing
    pub fn from_project_toml<P: AsRef<Path>>(path: P) -> Result<Self, LimitError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(
                target: "stmt_parse::limits",
                path = %path.display(),
                "no project file, using default limits"
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| LimitError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        let limits = Self::from_toml_str(&content).map_err(|e| LimitError {
            message: format!("Failed to parse {}: {}", path.display(), e.message),
        })?;

        tracing::debug!(
            target: "stmt_parse::limits",
            path = %path.display(),
            ?limits,
            "loaded limits"
        );
        Ok(limits)
    }

    /// Parse the `[limits]` table of a project file, keeping defaults
    /// for every key that is not given
    pub fn from_toml_str(content: &str) -> Result<Self, LimitError> {
        let config: ProjectConfig = toml::from_str(content).map_err(|e| LimitError {
            message: e.to_string(),
        })?;

        let mut limits = Self::default();

        if let Some(overrides) = config.limits {
            let LimitsConfig {
                max_input_size,
                max_token_count,
                max_identifier_length,
                max_string_length,
                max_comment_length,
                max_nesting_depth,
                max_expr_depth,
                max_ast_nodes,
            } = overrides;

            let slots = [
                (max_input_size, &mut limits.max_input_size),
                (max_token_count, &mut limits.max_token_count),
                (max_identifier_length, &mut limits.max_identifier_length),
                (max_string_length, &mut limits.max_string_length),
                (max_comment_length, &mut limits.max_comment_length),
                (max_nesting_depth, &mut limits.max_nesting_depth),
                (max_expr_depth, &mut limits.max_expr_depth),
                (max_ast_nodes, &mut limits.max_ast_nodes),
            ];
            for (value, slot) in slots {
                if let Some(v) = value {
                    *slot = v;
                }
            }
        }

        Ok(limits)
    }

    /// Validate that all limits are reasonable (positive, not absurdly large)
    pub fn validate(&self) -> Result<(), LimitError> {
        const MAX_REASONABLE: usize = 100_000_000; // 100 MB

        let checks = [
            ("max_input_size", self.max_input_size, MAX_REASONABLE),
            ("max_token_count", self.max_token_count, MAX_REASONABLE),
            ("max_identifier_length", self.max_identifier_length, 100_000),
            ("max_string_length", self.max_string_length, MAX_REASONABLE),
            ("max_comment_length", self.max_comment_length, MAX_REASONABLE),
            ("max_nesting_depth", self.max_nesting_depth, 10_000),
            ("max_expr_depth", self.max_expr_depth, 10_000),
            ("max_ast_nodes", self.max_ast_nodes, 10 * MAX_REASONABLE),
        ];

        for (name, value, max) in checks {
            if value == 0 || value > max {
                return Err(LimitError::invalid(name, value));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProjectConfig {
    limits: Option<LimitsConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsConfig {
    max_input_size: Option<usize>,
    max_token_count: Option<usize>,
    max_identifier_length: Option<usize>,
    max_string_length: Option<usize>,
    max_comment_length: Option<usize>,
    max_nesting_depth: Option<usize>,
    max_expr_depth: Option<usize>,
    max_ast_nodes: Option<usize>,
}

/// Error type for limit validation and loading
#[derive(Debug, Clone)]
pub struct LimitError {
    pub message: String,
}

impl LimitError {
    fn invalid(name: &str, value: usize) -> Self {
        Self {
            message: format!(
                "Invalid limit '{}': {} (must be positive and reasonable)",
                name, value
            ),
        }
    }
}

impl std::fmt::Display for LimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Limit error: {}", self.message)
    }
}

impl std::error::Error for LimitError {}
