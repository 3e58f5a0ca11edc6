// kakusu-core/src/category.rs
//! Canonical entity categories and the tables that map labels onto them.
//!
//! Rule groups, the external recognizer and caller-supplied literals all speak
//! slightly different label dialects. Everything is normalized into [`Category`]
//! here, and every per-category constant (priorities, rule-group names) is an
//! exhaustive `match` so a new variant cannot silently miss a table.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Priority given to caller-supplied literal spans. Lower wins.
pub const CUSTOM_PRIORITY: i32 = -1;

/// Priority of a rule category that has no dedicated entry.
pub const DEFAULT_RULE_PRIORITY: i32 = 9;

/// Priority of a recognizer category that has no dedicated entry.
pub const DEFAULT_NER_PRIORITY: i32 = 99;

/// A normalized entity category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Org,
    Person,
    Location,
    Position,
    Product,
    Date,
    Time,
    Money,
    Event,
    Email,
    Phone,
    Project,
    Department,
    Country,
    Custom,
    /// Any label outside the canonical set, stored upper-cased.
    Other(String),
}

impl Category {
    /// Every canonical category, in display order.
    pub const CANONICAL: [Category; 15] = [
        Category::Org,
        Category::Person,
        Category::Location,
        Category::Position,
        Category::Product,
        Category::Date,
        Category::Time,
        Category::Money,
        Category::Event,
        Category::Email,
        Category::Phone,
        Category::Project,
        Category::Department,
        Category::Country,
        Category::Custom,
    ];

    /// The category code used in mappings, templates and the CLI.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Org => "ORG",
            Category::Person => "PERSON",
            Category::Location => "LOCATION",
            Category::Position => "POSITION",
            Category::Product => "PRODUCT",
            Category::Date => "DATE",
            Category::Time => "TIME",
            Category::Money => "MONEY",
            Category::Event => "EVENT",
            Category::Email => "EMAIL",
            Category::Phone => "PHONE",
            Category::Project => "PROJECT",
            Category::Department => "DEPARTMENT",
            Category::Country => "COUNTRY",
            Category::Custom => "CUSTOM",
            Category::Other(label) => label.as_str(),
        }
    }

    /// Parses a canonical code (case-insensitive). Unknown codes become `Other`.
    pub fn from_code(code: &str) -> Self {
        let upper = code.trim().to_uppercase();
        match upper.as_str() {
            "ORG" => Category::Org,
            "PERSON" => Category::Person,
            "LOCATION" => Category::Location,
            "POSITION" => Category::Position,
            "PRODUCT" => Category::Product,
            "DATE" => Category::Date,
            "TIME" => Category::Time,
            "MONEY" => Category::Money,
            "EVENT" => Category::Event,
            "EMAIL" => Category::Email,
            "PHONE" => Category::Phone,
            "PROJECT" => Category::Project,
            "DEPARTMENT" => Category::Department,
            "COUNTRY" => Category::Country,
            "CUSTOM" => Category::Custom,
            _ => Category::Other(upper),
        }
    }

    /// Normalizes a label emitted by the external recognizer (or a legacy rule-group
    /// label) onto the canonical set. Unmapped labels pass through upper-cased.
    pub fn from_ner_label(label: &str) -> Self {
        match label {
            "Person" | "PSN" | "NAME" | "人名" => Category::Person,
            "Province" | "City" | "GPE" | "LOC" | "Place" | "地名" => Category::Location,
            "Company" | "Corporation_Other" | "Organization" | "ORG" => Category::Org,
            "Product_Other" | "Product" => Category::Product,
            "Date" | "Time_Date" => Category::Date,
            "Time" => Category::Time,
            "Money" => Category::Money,
            "Position_Vocation" | "Position" => Category::Position,
            "Event" => Category::Event,
            "COMPANY" | "COMPANY_PATTERNS" => Category::Org,
            "SENSITIVE_TERMS_POSITION" => Category::Position,
            "SENSITIVE_TERMS_DEPARTMENT" => Category::Department,
            other => Category::from_code(other),
        }
    }

    /// Maps a rule-group key from the rule file onto a category.
    pub fn from_rule_group(group: &str) -> Self {
        match group.to_lowercase().as_str() {
            "company" | "org" => Category::Org,
            "email" => Category::Email,
            "phone" => Category::Phone,
            "project" => Category::Project,
            "position" => Category::Position,
            "department" => Category::Department,
            "person" => Category::Person,
            other => Category::from_code(other),
        }
    }

    /// Precedence of a rule-sourced span of this category.
    pub fn rule_priority(&self) -> i32 {
        match self {
            Category::Position | Category::Person => 1,
            Category::Org => 2,
            Category::Department => 3,
            Category::Project => 4,
            Category::Email => 5,
            Category::Phone => 6,
            Category::Custom => CUSTOM_PRIORITY,
            Category::Location
            | Category::Product
            | Category::Date
            | Category::Time
            | Category::Money
            | Category::Event
            | Category::Country
            | Category::Other(_) => DEFAULT_RULE_PRIORITY,
        }
    }

    /// Precedence of a recognizer-sourced span of this category. Always weaker than
    /// any rule priority.
    pub fn ner_priority(&self) -> i32 {
        match self {
            Category::Person | Category::Position => 10,
            Category::Org => 11,
            Category::Location => 12,
            Category::Product | Category::Event => 13,
            Category::Date => 14,
            Category::Time => 15,
            Category::Money => 16,
            Category::Email
            | Category::Phone
            | Category::Project
            | Category::Department
            | Category::Country
            | Category::Custom
            | Category::Other(_) => DEFAULT_NER_PRIORITY,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from_code(s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Category::from_code(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ner_aliases_collapse_onto_canonical_set() {
        assert_eq!(Category::from_ner_label("PSN"), Category::Person);
        assert_eq!(Category::from_ner_label("人名"), Category::Person);
        assert_eq!(Category::from_ner_label("City"), Category::Location);
        assert_eq!(Category::from_ner_label("Corporation_Other"), Category::Org);
        assert_eq!(Category::from_ner_label("Time_Date"), Category::Date);
        assert_eq!(Category::from_ner_label("Position_Vocation"), Category::Position);
        assert_eq!(Category::from_ner_label("SENSITIVE_TERMS_DEPARTMENT"), Category::Department);
    }

    #[test]
    fn test_unmapped_label_passes_through_upper_cased() {
        assert_eq!(
            Category::from_ner_label("School"),
            Category::Other("SCHOOL".to_string())
        );
        assert_eq!(Category::from_ner_label("email"), Category::Email);
    }

    #[test]
    fn test_every_ner_priority_is_weaker_than_every_rule_priority() {
        let weakest_rule = Category::CANONICAL
            .iter()
            .filter(|c| **c != Category::Custom)
            .map(Category::rule_priority)
            .max()
            .unwrap();
        let strongest_ner = Category::CANONICAL.iter().map(Category::ner_priority).min().unwrap();
        assert!(weakest_rule < strongest_ner);
    }

    #[test]
    fn test_serde_uses_category_codes() {
        let json = serde_json::to_string(&Category::Department).unwrap();
        assert_eq!(json, "\"DEPARTMENT\"");
        let back: Category = serde_json::from_str("\"plan\"").unwrap();
        assert_eq!(back, Category::Other("PLAN".to_string()));
    }
}
