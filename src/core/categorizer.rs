//! Rule-based transaction categorization
//!
//! This module provides the `RuleEngine`, which compiles a [`RuleBook`] once
//! and then turns raw transactions into categorized ones.
//!
//! # Design
//!
//! The engine is an ordered list of (matcher, category, subcategory) rules
//! evaluated top to bottom with first-match-wins semantics. Compilation
//! validates every pattern and every rule outcome up front, so
//! categorization itself cannot fail.
//!
//! # Thread Safety
//!
//! A compiled engine is immutable. Share it across workers behind an `Arc`;
//! no locking is required.

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use tracing::debug;

use super::rules::{RuleBook, RuleDefinition, SubcategoryRule};
use crate::types::{
    AggregatorError, CategorizedTransaction, Category, Classification, RawTransaction,
    SourceType, Subcategory,
};

/// Maximum length, in characters, of a derived merchant name
pub const MERCHANT_NAME_MAX_LEN: usize = 50;

/// Name reported when no rule matched and the amount sign decided
const AMOUNT_FALLBACK: &str = "amount_sign";

#[derive(Debug)]
enum CompiledSubcategory {
    Fixed(Subcategory),
    Refined {
        refinements: Vec<(Regex, Subcategory)>,
        default: Subcategory,
    },
}

#[derive(Debug)]
struct CompiledRule {
    name: String,
    matcher: Regex,
    category: Category,
    subcategory: CompiledSubcategory,
}

impl CompiledRule {
    fn compile(definition: &RuleDefinition) -> Result<Self, AggregatorError> {
        let matcher = compile_keywords(&definition.name, &definition.keywords)?;

        let subcategory = match &definition.subcategory {
            SubcategoryRule::Fixed(subcategory) => {
                check_outcome(&definition.name, definition.category, *subcategory)?;
                CompiledSubcategory::Fixed(*subcategory)
            }
            SubcategoryRule::Refined {
                refinements,
                default,
            } => {
                check_outcome(&definition.name, definition.category, *default)?;
                let refinements = refinements
                    .iter()
                    .map(|refinement| {
                        check_outcome(&definition.name, definition.category, refinement.subcategory)?;
                        let matcher = compile_keywords(&definition.name, &refinement.keywords)?;
                        Ok((matcher, refinement.subcategory))
                    })
                    .collect::<Result<Vec<_>, AggregatorError>>()?;
                CompiledSubcategory::Refined {
                    refinements,
                    default: *default,
                }
            }
        };

        Ok(Self {
            name: definition.name.clone(),
            matcher,
            category: definition.category,
            subcategory,
        })
    }

    fn classify(&self, description: &str) -> Option<Classification> {
        if !self.matcher.is_match(description) {
            return None;
        }

        let subcategory = match &self.subcategory {
            CompiledSubcategory::Fixed(subcategory) => *subcategory,
            CompiledSubcategory::Refined {
                refinements,
                default,
            } => refinements
                .iter()
                .find(|(matcher, _)| matcher.is_match(description))
                .map(|(_, subcategory)| *subcategory)
                .unwrap_or(*default),
        };

        Some(Classification::new(self.category, subcategory))
    }
}

#[derive(Debug)]
struct CompiledSourceRules {
    source_type: SourceType,
    rules: Vec<CompiledRule>,
    fallback: Classification,
}

/// Outcome of running the cascade over one description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    /// Name of the rule (or fallback) that decided the classification
    pub rule: &'a str,
    pub classification: Classification,
}

/// Compiled, immutable categorization rule engine
#[derive(Debug)]
pub struct RuleEngine {
    priority: Vec<CompiledRule>,
    by_source: Vec<CompiledSourceRules>,
    fallback_names: Vec<(SourceType, String)>,
    merchant_noise: Option<Regex>,
}

impl RuleEngine {
    /// Compile the standard rule book
    pub fn standard() -> Result<Self, AggregatorError> {
        Self::from_rule_book(&RuleBook::standard())
    }

    /// Compile a rule book
    ///
    /// # Errors
    ///
    /// Returns `AggregatorError::InvalidRule` if a rule has no keywords, a
    /// keyword is not a valid pattern, or a rule outcome pairs a category
    /// with a subcategory it does not allow.
    pub fn from_rule_book(book: &RuleBook) -> Result<Self, AggregatorError> {
        let priority = book
            .priority
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_source = Vec::with_capacity(book.by_source.len());
        let mut fallback_names = Vec::with_capacity(book.by_source.len());
        for source in &book.by_source {
            let fallback_name = format!("{}_fallback", source.source_type.as_str().to_lowercase());
            check_outcome(
                &fallback_name,
                source.fallback.category,
                source.fallback.subcategory,
            )?;
            by_source.push(CompiledSourceRules {
                source_type: source.source_type,
                rules: source
                    .rules
                    .iter()
                    .map(CompiledRule::compile)
                    .collect::<Result<Vec<_>, _>>()?,
                fallback: source.fallback,
            });
            fallback_names.push((source.source_type, fallback_name));
        }

        let merchant_noise = if book.merchant_noise.is_empty() {
            None
        } else {
            Some(compile_keywords("merchant_noise", &book.merchant_noise)?)
        };

        Ok(Self {
            priority,
            by_source,
            fallback_names,
            merchant_noise,
        })
    }

    /// Categorize a raw transaction
    ///
    /// Every raw field is copied through unchanged; only the classification
    /// and merchant name are derived.
    pub fn categorize(&self, raw: RawTransaction) -> CategorizedTransaction {
        let matched = self.classify(raw.source_type, &raw.description, raw.amount);

        debug!(
            transaction_id = %raw.transaction_id,
            rule = matched.rule,
            category = %matched.classification.category,
            subcategory = %matched.classification.subcategory,
            "Categorized transaction"
        );

        let classification = matched.classification;
        let merchant_name = self.extract_merchant_name(&raw.description);
        CategorizedTransaction::new(raw, classification, merchant_name)
    }

    /// Run the rule cascade and report which rule decided
    ///
    /// 1. Priority rules, regardless of source type
    /// 2. Rules for the source type, then that source type's fallback
    /// 3. For source types without rules, the sign of the amount
    pub fn classify(&self, source_type: SourceType, description: &str, amount: Decimal) -> RuleMatch<'_> {
        if let Some(found) = first_match(&self.priority, description) {
            return found;
        }

        if let Some(source) = self
            .by_source
            .iter()
            .find(|source| source.source_type == source_type)
        {
            return first_match(&source.rules, description).unwrap_or_else(|| RuleMatch {
                rule: self.fallback_name(source_type),
                classification: source.fallback,
            });
        }

        let classification = if amount > Decimal::ZERO {
            Classification::new(Category::Income, Subcategory::Other)
        } else {
            Classification::new(Category::Expenses, Subcategory::Other)
        };

        RuleMatch {
            rule: AMOUNT_FALLBACK,
            classification,
        }
    }

    /// Derive a merchant name from a description
    ///
    /// Noise tokens are removed case-insensitively, the remainder is trimmed
    /// and cut to [`MERCHANT_NAME_MAX_LEN`] characters. A blank result yields
    /// `None`.
    pub fn extract_merchant_name(&self, description: &str) -> Option<String> {
        let stripped = match &self.merchant_noise {
            Some(noise) => noise.replace_all(description, ""),
            None => description.into(),
        };

        let merchant: String = stripped.trim().chars().take(MERCHANT_NAME_MAX_LEN).collect();

        if merchant.is_empty() {
            None
        } else {
            Some(merchant)
        }
    }

    fn fallback_name(&self, source_type: SourceType) -> &str {
        self.fallback_names
            .iter()
            .find(|(source, _)| *source == source_type)
            .map(|(_, name)| name.as_str())
            .unwrap_or(AMOUNT_FALLBACK)
    }
}

fn first_match<'a>(rules: &'a [CompiledRule], description: &str) -> Option<RuleMatch<'a>> {
    rules.iter().find_map(|rule| {
        rule.classify(description).map(|classification| RuleMatch {
            rule: rule.name.as_str(),
            classification,
        })
    })
}

fn compile_keywords(rule: &str, keywords: &[String]) -> Result<Regex, AggregatorError> {
    if keywords.is_empty() {
        return Err(AggregatorError::invalid_rule(rule, "rule has no keywords"));
    }

    RegexBuilder::new(&keywords.join("|"))
        .case_insensitive(true)
        .build()
        .map_err(|e| AggregatorError::invalid_rule(rule, e.to_string()))
}

fn check_outcome(
    rule: &str,
    category: Category,
    subcategory: Subcategory,
) -> Result<(), AggregatorError> {
    if category.allows(subcategory) {
        Ok(())
    } else {
        Err(AggregatorError::invalid_rule(
            rule,
            format!("{} does not allow subcategory {}", category, subcategory),
        ))
    }
}
