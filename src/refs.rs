//! Reference resolver: walks the schema, fetches remote `$ref` targets, rewrites
//! local `#/...` pointers to absolute form, and indexes resolved sub-schemas.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaError;

/// Injected collaborator for retrieving a remote schema document by URI.
///
/// Called at most once per distinct base URI seen during reference resolution.
pub trait Fetcher {
    /// # Errors
    /// Returns a boxed error when the document at `uri` cannot be retrieved; the
    /// error propagates out of compilation rather than being accumulated.
    fn fetch(&self, uri: &str) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// The default fetcher used by [`crate::compile`]: never performs I/O, returns an
/// empty object for any URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFetcher;

impl Fetcher for NoopFetcher {
    fn fetch(&self, _uri: &str) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Value::Object(serde_json::Map::new()))
    }
}

/// URI -> resolved sub-schema, populated lazily during resolution.
pub type RefIndex = IndexMap<String, Value>;

pub struct Resolver<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub refs: RefIndex,
    pub errors: Vec<SchemaError>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            refs: RefIndex::new(),
            errors: Vec::new(),
        }
    }

    /// Walks `schema` under base `url`, mutating `$ref` strings to absolute form and
    /// populating `self.refs`. Returns `Err` only when a fetch fails; all other
    /// problems are recorded in `self.errors`.
    pub fn resolve_refs(&mut self, schema: &mut Value, root: &Value, url: &str) -> Result<(), SchemaError> {
        match schema {
            Value::Array(items) => {
                for item in items {
                    self.resolve_refs(item, root, url)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                if let Some(Value::String(r)) = map.get("$ref").cloned() {
                    self.resolve_one_ref(map, root, url, &r)?;
                    Ok(())
                } else {
                    let keys: Vec<String> = map.keys().cloned().collect();
                    for key in keys {
                        if let Some(mut v) = map.remove(&key) {
                            self.resolve_refs(&mut v, root, url)?;
                            map.insert(key, v);
                        }
                    }
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn resolve_one_ref(
        &mut self,
        map: &mut serde_json::Map<String, Value>,
        root: &Value,
        url: &str,
        r: &str,
    ) -> Result<(), SchemaError> {
        if let Some(rest) = r.strip_prefix("https://") {
            let full = format!("https://{rest}");
            let (base, fragment) = match full.split_once('#') {
                Some((b, f)) => (b.to_string(), Some(f.to_string())),
                None => (full.clone(), None),
            };
            if !self.refs.contains_key(&base) {
                let mut doc = self
                    .fetcher
                    .fetch(&base)
                    .map_err(|source| SchemaError::FetchFailure {
                        uri: base.clone(),
                        source,
                    })?;
                let doc_root = doc.clone();
                self.resolve_refs(&mut doc, &doc_root, &base)?;
                self.refs.insert(base.clone(), doc);
            }
            let Some(fragment) = fragment.filter(|f| !f.is_empty()) else {
                return Ok(());
            };
            let target = self.refs.get(&base).cloned().unwrap_or(Value::Null);
            self.walk_pointer(&format!("{base}#{fragment}"), &target, &fragment);
            Ok(())
        } else if let Some(pointer) = r.strip_prefix("#/") {
            let absolute = format!("{url}#/{pointer}");
            map.insert("$ref".to_string(), Value::String(absolute.clone()));
            self.walk_pointer(&absolute, root, pointer);
            Ok(())
        } else {
            self.errors.push(SchemaError::UnsupportedRef {
                reference: r.to_string(),
            });
            Ok(())
        }
    }

    fn walk_pointer(&mut self, absolute: &str, target: &Value, pointer: &str) {
        let mut current = target;
        for token in pointer.split('/').filter(|t| !t.is_empty()) {
            match current.get(token) {
                Some(next) => current = next,
                None => {
                    self.errors.push(SchemaError::UnresolvedRef {
                        reference: absolute.to_string(),
                        token: token.to_string(),
                        dump: current.to_string(),
                    });
                    return;
                }
            }
        }
        self.refs.insert(absolute.to_string(), current.clone());
    }
}
