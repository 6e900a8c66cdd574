use serde::{Deserialize, Serialize};

/// Value type a field holds after CSV coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Number,
    Date,
    DateTime,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Text => write!(f, "text"),
            ValueType::Number => write!(f, "number"),
            ValueType::Date => write!(f, "date"),
            ValueType::DateTime => write!(f, "datetime"),
        }
    }
}

/// Describes a single field of the transaction schema.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub value_type: ValueType,
    pub description: &'static str,
}

/// Immutable catalog of transaction fields plus the alias and operator
/// phrase tables. Constructed once at process start.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
    /// Lowercase free-text phrase → canonical field name.
    aliases: Vec<(&'static str, &'static str)>,
}

/// Operator phrase → canonical symbol. Shared with rule generation so the
/// prompt vocabulary and the resolver never drift apart.
const OPERATOR_PHRASES: &[(&str, &str)] = &[
    ("less than", "lessThan"),
    ("under", "lessThan"),
    ("below", "lessThan"),
    ("lt", "lessThan"),
    ("greater than", "greaterThan"),
    ("more than", "greaterThan"),
    ("over", "greaterThan"),
    ("above", "greaterThan"),
    ("gt", "greaterThan"),
    ("equal", "equal"),
    ("equals", "equal"),
    ("is", "equal"),
    ("eq", "equal"),
    ("not equal", "notEqual"),
    ("is not", "notEqual"),
    ("ne", "notEqual"),
    ("neq", "notEqual"),
    ("at most", "lessThanInclusive"),
    ("no more than", "lessThanInclusive"),
    ("lte", "lessThanInclusive"),
    ("at least", "greaterThanInclusive"),
    ("no less than", "greaterThanInclusive"),
    ("gte", "greaterThanInclusive"),
    ("contains", "contains"),
    ("includes", "contains"),
    ("has", "contains"),
    ("in", "in"),
    ("one of", "in"),
    ("among", "in"),
];

impl FieldCatalog {
    /// The fixed credit-card transaction schema.
    pub fn transactions() -> Self {
        Self {
            fields: vec![
                FieldDescriptor {
                    name: "trans_num",
                    value_type: ValueType::Text,
                    description: "unique transaction identifier",
                },
                FieldDescriptor {
                    name: "date",
                    value_type: ValueType::DateTime,
                    description: "date and time the transaction occurred",
                },
                FieldDescriptor {
                    name: "merchant",
                    value_type: ValueType::Text,
                    description: "merchant the card was charged at",
                },
                FieldDescriptor {
                    name: "category",
                    value_type: ValueType::Text,
                    description: "spending category (e.g. grocery_pos, gas_transport)",
                },
                FieldDescriptor {
                    name: "amt",
                    value_type: ValueType::Number,
                    description: "transaction amount in dollars",
                },
                FieldDescriptor {
                    name: "city",
                    value_type: ValueType::Text,
                    description: "city where the transaction took place",
                },
                FieldDescriptor {
                    name: "state",
                    value_type: ValueType::Text,
                    description: "two-letter state code",
                },
                FieldDescriptor {
                    name: "isFraud",
                    value_type: ValueType::Number,
                    description: "1 if the transaction was flagged fraudulent, 0 otherwise",
                },
            ],
            aliases: vec![
                ("amount", "amt"),
                ("price", "amt"),
                ("cost", "amt"),
                ("spent", "amt"),
                ("total", "amt"),
                ("fraud", "isFraud"),
                ("fraudulent", "isFraud"),
                ("scam", "isFraud"),
                ("store", "merchant"),
                ("shop", "merchant"),
                ("vendor", "merchant"),
                ("seller", "merchant"),
                ("type", "category"),
                ("kind", "category"),
                ("when", "date"),
                ("time", "date"),
                ("day", "date"),
                ("town", "city"),
                ("location", "city"),
                ("id", "trans_num"),
                ("transaction id", "trans_num"),
            ],
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field descriptor by canonical name.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve free text to a canonical field name: alias table first,
    /// then case-insensitive descriptor-name match. `None` on miss —
    /// the caller decides whether an unresolved field is fatal.
    pub fn resolve_field(&self, text: &str) -> Option<&'static str> {
        let needle = text.trim().to_lowercase();
        if let Some((_, name)) = self.aliases.iter().find(|(alias, _)| *alias == needle) {
            return Some(name);
        }
        self.fields
            .iter()
            .find(|f| f.name.to_lowercase() == needle)
            .map(|f| f.name)
    }

    /// Resolve an operator phrase to its canonical symbol. On miss the
    /// input is returned unchanged; callers must treat a non-canonical
    /// return as invalid.
    pub fn resolve_operator<'a>(&self, text: &'a str) -> &'a str {
        let needle = text.trim().to_lowercase();
        OPERATOR_PHRASES
            .iter()
            .find(|(phrase, _)| *phrase == needle)
            .map(|(_, symbol)| *symbol)
            .unwrap_or(text)
    }

    /// Nearest field name for "did you mean" suggestions: alias or
    /// descriptor whose name contains (or is contained by) the input.
    pub fn suggest_field(&self, text: &str) -> Option<&'static str> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.aliases
            .iter()
            .find(|(alias, _)| alias.contains(&needle) || needle.contains(alias))
            .map(|(_, name)| *name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|f| {
                        let name = f.name.to_lowercase();
                        name.contains(&needle) || needle.contains(&name)
                    })
                    .map(|f| f.name)
            })
    }

    /// Render the field table for embedding in the generation prompt.
    pub fn to_prompt_section(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Available fields:".to_string());
        for field in &self.fields {
            lines.push(format!(
                "  - {} ({}): {}",
                field.name, field.value_type, field.description
            ));
        }
        lines.join("\n")
    }
}

// ── Tests ───────────────────────────────────────────────────────────
