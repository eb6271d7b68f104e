//! JSON schema documents describing a module's exposed symbol tree.

use serde::Deserialize;
use yara_diagnostic::ModuleError;
use yara_ir::{FunctionOverload, Structure, StructureError, Symbol, ValueType};
use yara_ir::name::StringInterner;

/// One JSON node of a module schema document. Mirrors the on-disk shape:
/// `{"name": ..., "kind": "struct|reference|function|value|array|dictionary", ...}`.
#[derive(Deserialize, Debug, Clone)]
pub struct SchemaNode {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub attributes: Vec<SchemaNode>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub overloads: Vec<SchemaOverload>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchemaOverload {
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: String,
}

fn parse_value_type(ty: &str) -> Result<ValueType, ModuleError> {
    match ty {
        "integer" => Ok(ValueType::Integer),
        "float" => Ok(ValueType::Float),
        "bool" | "boolean" => Ok(ValueType::Bool),
        "text" | "string" => Ok(ValueType::Text),
        other => Err(ModuleError::UnknownType { ty: other.to_string() }),
    }
}

/// Converts a parsed [`SchemaNode`] tree into a [`Symbol`], interning all
/// names along the way. `reference` nodes are resolved against `target`
/// lazily by the caller ([`crate::pool::ModulePool`]) once every top-level
/// module has been loaded, since a reference may point at a structure
/// defined in a schema document parsed later.
pub fn node_to_symbol(node: &SchemaNode, interner: &StringInterner) -> Result<Symbol, ModuleError> {
    let name = interner.intern(&node.name);
    match node.kind.as_str() {
        "value" => {
            let ty = node
                .r#type
                .as_deref()
                .ok_or_else(|| ModuleError::InvalidSchema {
                    path: node.name.clone(),
                    message: "value node missing 'type'".into(),
                })?;
            Ok(Symbol::Value { name, ty: parse_value_type(ty)? })
        }
        "array" => {
            let elem_node = node.attributes.first().ok_or_else(|| ModuleError::InvalidSchema {
                path: node.name.clone(),
                message: "array node missing element schema".into(),
            })?;
            let element = node_to_symbol(elem_node, interner)?;
            Ok(Symbol::Array { name, element: Box::new(element) })
        }
        "dictionary" => {
            let value_node = node.attributes.first().ok_or_else(|| ModuleError::InvalidSchema {
                path: node.name.clone(),
                message: "dictionary node missing value schema".into(),
            })?;
            let value = node_to_symbol(value_node, interner)?;
            Ok(Symbol::Dictionary { name, value: Box::new(value) })
        }
        "function" => {
            let mut overloads = Vec::with_capacity(node.overloads.len());
            for o in &node.overloads {
                let params = o.params.iter().map(|p| parse_value_type(p)).collect::<Result<_, _>>()?;
                let return_type = parse_value_type(&o.returns)?;
                overloads.push(FunctionOverload { params, return_type });
            }
            Ok(Symbol::Function { name, overloads })
        }
        "struct" => {
            let mut structure = Structure::new();
            for attr in &node.attributes {
                let sym = node_to_symbol(attr, interner)?;
                structure.insert(sym).map_err(|e| ModuleError::InvalidSchema {
                    path: node.name.clone(),
                    message: match e {
                        StructureError::DuplicateAttribute(_) => "duplicate attribute name".into(),
                        StructureError::MergeConflict(_) => "conflicting attribute definition".into(),
                    },
                })?;
            }
            Ok(Symbol::Structure { name, attributes: structure })
        }
        "reference" => {
            let target = node.target.clone().ok_or_else(|| ModuleError::InvalidSchema {
                path: node.name.clone(),
                message: "reference node missing 'target'".into(),
            })?;
            Ok(Symbol::Reference { name, target: interner.intern(&target) })
        }
        other => Err(ModuleError::UnknownKind { kind: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_struct_with_a_value_attribute() {
        let interner = StringInterner::new();
        let json = r#"{
            "name": "pe",
            "kind": "struct",
            "attributes": [
                {"name": "number_of_sections", "kind": "value", "type": "integer"}
            ]
        }"#;
        let node: SchemaNode = serde_json::from_str(json).unwrap();
        let symbol = node_to_symbol(&node, &interner).unwrap();
        match symbol {
            Symbol::Structure { attributes, .. } => assert_eq!(attributes.len(), 1),
            other => panic!("unexpected symbol: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let interner = StringInterner::new();
        let node = SchemaNode {
            name: "x".into(),
            kind: "bogus".into(),
            r#type: None,
            attributes: vec![],
            target: None,
            overloads: vec![],
            features: vec![],
        };
        assert!(matches!(node_to_symbol(&node, &interner), Err(ModuleError::UnknownKind { .. })));
    }
}
