//! SQL queries: one method per `.sql` file, named after the file.
use crate::emit::TemplateEmitter;
use crate::RulesConfig;
use serde::{Deserialize, Serialize};
use sgen_core::{
    is_identifier, EmitError, EmptyPolicy, FileExtension, GenerationRule, Pipeline, RawInput,
    StageSet, TransformError,
};
use sgen_out::TemplateRenderer;
use std::collections::HashMap;
use std::sync::Arc;

pub const NAME: &str = "sql_queries";
pub const OUTPUT: &str = "sql_queries.g.rs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMethod {
    pub name: String,
    pub sql: String,
}

/// Method name from the file stem, body from the trimmed content.
pub fn query_method(raw: &RawInput) -> Result<QueryMethod, TransformError> {
    let name = raw.file_stem().unwrap_or_default();
    if !is_identifier(name) {
        return Err(TransformError::InvalidIdentifier(name.to_string()));
    }
    let sql = raw.content()?.trim();
    if sql.is_empty() {
        return Err(TransformError::Malformed("empty query".to_string()));
    }
    if sql.contains('\0') {
        return Err(TransformError::Malformed("query contains a NUL byte".to_string()));
    }
    Ok(QueryMethod {
        name: name.to_string(),
        sql: sql.to_string(),
    })
}

/// Collect query methods; two files with the same stem would produce the
/// same method twice.
pub fn collect_methods(set: &StageSet<QueryMethod>) -> Result<Vec<QueryMethod>, EmitError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for entry in set.entries() {
        if let Some(first) = seen.insert(&entry.value.name, entry.fingerprint.identity()) {
            return Err(EmitError::Merge(format!(
                "method '{}' defined by both {} and {}",
                entry.value.name,
                first,
                entry.fingerprint.identity()
            )));
        }
    }
    Ok(set.entries().iter().map(|e| e.value.clone()).collect())
}

pub fn rule(config: &RulesConfig, renderer: &Arc<TemplateRenderer>) -> Box<dyn GenerationRule> {
    Box::new(
        Pipeline::new(
            NAME,
            OUTPUT,
            FileExtension::new(config.sql_extension.clone()),
            query_method,
            collect_methods,
            TemplateEmitter::new(renderer.clone(), NAME, "queries"),
        )
        .with_empty_policy(EmptyPolicy::Skip),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgen_core::{Fingerprint, Signature, StageEntry};

    #[test]
    fn test_query_method() {
        let raw = RawInput::additional_file("queries/GetUsers.sql", "\nSELECT * FROM users\n");
        let method = query_method(&raw).unwrap();
        assert_eq!(method.name, "GetUsers");
        assert_eq!(method.sql, "SELECT * FROM users");
    }

    #[test]
    fn test_empty_query_is_malformed() {
        let raw = RawInput::additional_file("queries/Nothing.sql", "  \n ");
        assert_eq!(
            query_method(&raw),
            Err(TransformError::Malformed("empty query".to_string()))
        );
    }

    #[test]
    fn test_stem_must_be_identifier() {
        let raw = RawInput::additional_file("queries/get-users.sql", "SELECT 1");
        assert_eq!(
            query_method(&raw),
            Err(TransformError::InvalidIdentifier("get-users".to_string()))
        );
    }

    #[test]
    fn test_same_method_from_two_files_fails_merge() {
        let entry = |path: &str| StageEntry {
            fingerprint: Fingerprint::new(path, Signature::from_token("1")),
            value: QueryMethod {
                name: "Users".to_string(),
                sql: "SELECT 1".to_string(),
            },
        };
        let set = StageSet::from_entries(vec![entry("a/Users.sql"), entry("b/Users.sql")]);
        assert!(matches!(collect_methods(&set), Err(EmitError::Merge(_))));
    }
}
