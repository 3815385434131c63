//! Categorization rules as data
//!
//! A [`RuleBook`] holds the keyword tables the rule engine is compiled from.
//! Keywords are regular-expression fragments matched case-insensitively
//! anywhere in a transaction description; the keywords of one rule are
//! combined as alternatives.
//!
//! # Evaluation order
//!
//! ```text
//! priority rules (any source type)      first match wins
//!     ↓ no match
//! source rules for the record's type    first match wins, else source fallback
//!     ↓ no rule set for the type
//! sign of the amount                    > 0 INCOME/OTHER, else EXPENSES/OTHER
//! ```

use crate::types::{Category, Classification, SourceType, Subcategory};

/// How a matching rule picks its subcategory
#[derive(Debug, Clone, PartialEq)]
pub enum SubcategoryRule {
    /// Always the same subcategory
    Fixed(Subcategory),

    /// First matching refinement wins, otherwise `default`
    Refined {
        refinements: Vec<Refinement>,
        default: Subcategory,
    },
}

/// A nested keyword set selecting a subcategory within a rule's category
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub keywords: Vec<String>,
    pub subcategory: Subcategory,
}

/// A single rule: keywords plus the classification they produce
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    /// Name reported in logs when the rule matches
    pub name: String,
    pub keywords: Vec<String>,
    pub category: Category,
    pub subcategory: SubcategoryRule,
}

/// Ordered rules for one source type and the classification used when none match
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRules {
    pub source_type: SourceType,
    pub rules: Vec<RuleDefinition>,
    pub fallback: Classification,
}

/// Complete set of categorization rules
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    /// Rules checked before any source-type branching
    pub priority: Vec<RuleDefinition>,

    /// Source-type branches; a type without an entry falls back on the amount sign
    pub by_source: Vec<SourceRules>,

    /// Tokens removed from descriptions when deriving merchant names
    pub merchant_noise: Vec<String>,
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn fixed(name: &str, words: &[&str], category: Category, subcategory: Subcategory) -> RuleDefinition {
    RuleDefinition {
        name: name.to_string(),
        keywords: keywords(words),
        category,
        subcategory: SubcategoryRule::Fixed(subcategory),
    }
}

fn refine(words: &[&str], subcategory: Subcategory) -> Refinement {
    Refinement {
        keywords: keywords(words),
        subcategory,
    }
}

fn refined(
    name: &str,
    words: &[&str],
    category: Category,
    refinements: Vec<Refinement>,
    default: Subcategory,
) -> RuleDefinition {
    RuleDefinition {
        name: name.to_string(),
        keywords: keywords(words),
        category,
        subcategory: SubcategoryRule::Refined {
            refinements,
            default,
        },
    }
}

impl RuleBook {
    /// The standard South African retail banking rule set
    pub fn standard() -> Self {
        use Category::*;
        use Subcategory as Sub;

        let priority = vec![
            fixed(
                "income",
                &["salary", "wage", "income", "payment.*received"],
                Income,
                Sub::Salary,
            ),
            fixed("refund", &["refund"], Income, Sub::Refund),
        ];

        let bank_fees = SourceRules {
            source_type: SourceType::BankFee,
            rules: vec![fixed("atm_fee", &["atm"], BankFees, Sub::AtmFee)],
            fallback: Classification::new(BankFees, Sub::ServiceFee),
        };

        let debit_orders = SourceRules {
            source_type: SourceType::DebitOrder,
            rules: vec![
                refined(
                    "insurance",
                    &["insurance", "discovery", "old mutual", "outsurance", "medical aid"],
                    Insurance,
                    vec![
                        refine(&["medical", "health"], Sub::Medical),
                        refine(&["car", "vehicle", "auto"], Sub::Vehicle),
                        refine(&["life"], Sub::Life),
                    ],
                    Sub::Other,
                ),
                refined(
                    "utilities",
                    &[
                        "municipal",
                        "electricity",
                        "water",
                        "city of",
                        "city power",
                        "eskom",
                        "vodacom",
                        "mtn",
                        "telkom",
                    ],
                    Utilities,
                    vec![
                        refine(&["municipal", "city of"], Sub::Municipal),
                        refine(&["electricity", "eskom", "city power"], Sub::Electricity),
                        refine(&["water"], Sub::Water),
                    ],
                    Sub::Other,
                ),
                fixed(
                    "entertainment_subscription",
                    &[
                        "netflix",
                        "dstv",
                        "showmax",
                        "spotify",
                        "amazon prime",
                        "apple music",
                        "youtube",
                        "subscription",
                        "gym",
                        "virgin active",
                    ],
                    Entertainment,
                    Sub::Subscription,
                ),
            ],
            fallback: Classification::new(Expenses, Sub::Other),
        };

        // fast_food sits below dining, which already claims mcdonald and kfc.
        let cards = SourceRules {
            source_type: SourceType::Card,
            rules: vec![
                fixed(
                    "groceries",
                    &["woolworths", "checkers", "pick n pay", "spar", "shoprite", "makro", "game"],
                    Shopping,
                    Sub::Groceries,
                ),
                fixed(
                    "fuel",
                    &["shell", "engen", "bp", "sasol", "caltex", "total", "garage", "petrol", "fuel"],
                    Transport,
                    Sub::Fuel,
                ),
                fixed("rideshare", &["uber", "bolt", "taxify"], Transport, Sub::Rideshare),
                fixed(
                    "dining",
                    &[
                        "nando's",
                        "spur",
                        "steers",
                        "mcdonald",
                        "kfc",
                        "burger king",
                        "wimpy",
                        "pizza",
                        "restaurant",
                        "cafe",
                        "eats",
                    ],
                    FoodDrink,
                    Sub::Dining,
                ),
                fixed(
                    "fast_food",
                    &["mcdonald", "kfc", "burger", "chicken", "wings"],
                    FoodDrink,
                    Sub::FastFood,
                ),
                fixed(
                    "clothing",
                    &[
                        "mr price",
                        "edgars",
                        "truworths",
                        "woolworths.*fashion",
                        "h&m",
                        "zara",
                        "cotton on",
                        "clothing",
                        "fashion",
                    ],
                    Shopping,
                    Sub::Clothing,
                ),
                fixed(
                    "online_retail",
                    &["takealot", "amazon", "ebay", "online", "exclusive books"],
                    Shopping,
                    Sub::Other,
                ),
            ],
            fallback: Classification::new(Uncategorized, Sub::Other),
        };

        Self {
            priority,
            by_source: vec![bank_fees, debit_orders, cards],
            merchant_noise: keywords(&[
                "payment",
                "debit order",
                "subscription",
                "from",
                "to",
                "transfer",
                "-",
            ]),
        }
    }

    /// Rules for a source type, if the book has a branch for it
    pub fn source_rules(&self, source_type: SourceType) -> Option<&SourceRules> {
        self.by_source
            .iter()
            .find(|rules| rules.source_type == source_type)
    }

    /// Every rule in evaluation order, priority rules first
    pub fn all_rules(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.priority
            .iter()
            .chain(self.by_source.iter().flat_map(|source| source.rules.iter()))
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_book_has_no_eft_branch() {
        let book = RuleBook::standard();
        assert!(book.source_rules(SourceType::Eft).is_none());
        assert!(book.source_rules(SourceType::BankFee).is_some());
        assert!(book.source_rules(SourceType::DebitOrder).is_some());
        assert!(book.source_rules(SourceType::Card).is_some());
    }

    #[test]
    fn test_standard_book_rule_order() {
        let book = RuleBook::standard();
        let names: Vec<&str> = book.all_rules().map(|rule| rule.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "income",
                "refund",
                "atm_fee",
                "insurance",
                "utilities",
                "entertainment_subscription",
                "groceries",
                "fuel",
                "rideshare",
                "dining",
                "fast_food",
                "clothing",
                "online_retail",
            ]
        );
    }

    #[test]
    fn test_standard_book_outcomes_respect_category_table() {
        let book = RuleBook::standard();

        for rule in book.all_rules() {
            match &rule.subcategory {
                SubcategoryRule::Fixed(subcategory) => {
                    assert!(rule.category.allows(*subcategory), "rule {}", rule.name)
                }
                SubcategoryRule::Refined {
                    refinements,
                    default,
                } => {
                    assert!(rule.category.allows(*default), "rule {}", rule.name);
                    for refinement in refinements {
                        assert!(
                            rule.category.allows(refinement.subcategory),
                            "rule {}",
                            rule.name
                        );
                    }
                }
            }
        }

        for source in &book.by_source {
            assert!(source.fallback.category.allows(source.fallback.subcategory));
        }
    }
}
