use std::cell::RefCell;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;
use tree_sitter::{Parser, Tree};

use crate::parser_config::{Configuration, DEFAULT_COMPLIANCE_LEVEL, DEFAULT_ENCODING};

// ============================================================================
// thread_local Parser 复用
// ============================================================================
//
// Parser::new() 和 set_language() 涉及 native 层初始化。
// 每个线程只初始化一次 Parser。
//
// ============================================================================

thread_local! {
    static JAVA_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// 获取或初始化线程本地 Parser
fn with_parser<F, R>(language: &tree_sitter::Language, f: F) -> Result<R>
where
    F: FnOnce(&mut Parser) -> Result<R>,
{
    JAVA_PARSER.with(|cell| {
        let mut parser_opt = cell.borrow_mut();

        // 懒初始化 Parser
        if parser_opt.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(language)
                .map_err(|e| anyhow!("Failed to set language: {e}"))?;
            *parser_opt = Some(parser);
        }

        let parser = parser_opt
            .as_mut()
            .ok_or_else(|| anyhow!("Parser not initialised"))?;
        f(parser)
    })
}

/// A parsed compilation unit together with the text it was parsed from.
pub struct ParsedSource {
    pub source: String,
    pub tree: Tree,
}

/// Java source parser set up from a [`Configuration`].
///
/// The syntax tree does not depend on the classpath; the configuration only
/// decides how source bytes are decoded and which language level is logged.
pub struct JavaSourceParser {
    language: tree_sitter::Language,
    compliance_level: String,
    default_encoding: String,
}

impl Default for JavaSourceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaSourceParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::language(),
            compliance_level: DEFAULT_COMPLIANCE_LEVEL.to_string(),
            default_encoding: DEFAULT_ENCODING.to_string(),
        }
    }

    pub fn from_configuration(config: &Configuration) -> Self {
        debug!(
            "Java parser: compliance {}, encoding {}",
            config.compliance_level(),
            config.default_encoding()
        );
        Self {
            compliance_level: config.compliance_level().to_string(),
            default_encoding: config.default_encoding().to_string(),
            ..Self::new()
        }
    }

    pub fn compliance_level(&self) -> &str {
        &self.compliance_level
    }

    /// Parse source text. A tree containing syntax errors is rejected.
    pub fn parse(&self, code: &str) -> Result<Tree> {
        let tree = with_parser(&self.language, |parser| {
            parser.parse(code, None).ok_or_else(|| anyhow!("Failed to parse code"))
        })?;
        if tree.root_node().has_error() {
            bail!("syntax error");
        }
        Ok(tree)
    }

    /// Read and parse one file, decoding it with `encoding` (or the default).
    pub fn parse_file(&self, path: &Path, encoding: Option<&str>) -> Result<ParsedSource> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let label = encoding.unwrap_or(&self.default_encoding);
        let source = decode(&bytes, label, &self.default_encoding)
            .with_context(|| format!("decoding {}", path.display()))?;
        let tree = self
            .parse(&source)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(ParsedSource { source, tree })
    }
}

/// Decode with the charset named by `label`, or `fallback` when the label is
/// unknown. A byte order mark overrides the label. Malformed input is an error.
fn decode(bytes: &[u8], label: &str, fallback: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .or_else(|| {
            debug!("Unknown encoding {}, using {}", label, fallback);
            Encoding::for_label(fallback.trim().as_bytes())
        })
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        bail!("invalid {} input", used.name());
    }
    Ok(text.into_owned())
}
