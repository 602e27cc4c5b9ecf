//! Department assignment and priority tiers.
//!
//! Routing consumes a finished [`GrievanceAnalysis`]; it never calls external
//! services.

use crate::config::PriorityThresholds;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Sanitation,
    WaterSupply,
    Electricity,
    Roads,
    PublicSafety,
    Healthcare,
    Education,
    Housing,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Sanitation,
        Category::WaterSupply,
        Category::Electricity,
        Category::Roads,
        Category::PublicSafety,
        Category::Healthcare,
        Category::Education,
        Category::Housing,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sanitation => "sanitation",
            Category::WaterSupply => "water-supply",
            Category::Electricity => "electricity",
            Category::Roads => "roads",
            Category::PublicSafety => "public-safety",
            Category::Healthcare => "healthcare",
            Category::Education => "education",
            Category::Housing => "housing",
            Category::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Sanitation => "Sanitation & Waste",
            Category::WaterSupply => "Water Supply",
            Category::Electricity => "Electricity",
            Category::Roads => "Roads & Infrastructure",
            Category::PublicSafety => "Public Safety",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Housing => "Housing",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Category to department mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentTable {
    departments: HashMap<Category, String>,
    fallback: String,
}

impl DepartmentTable {
    pub fn new(departments: HashMap<Category, String>, fallback: impl Into<String>) -> Self {
        Self {
            departments,
            fallback: fallback.into(),
        }
    }

    pub fn department(&self, category: Category) -> &str {
        self.departments
            .get(&category)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

impl Default for DepartmentTable {
    fn default() -> Self {
        let departments = [
            (Category::Sanitation, "Municipal Corporation - Sanitation"),
            (Category::WaterSupply, "Water Supply Board"),
            (Category::Electricity, "Electricity Board"),
            (Category::Roads, "Public Works Department"),
            (Category::PublicSafety, "Police Department"),
            (Category::Healthcare, "Health Department"),
            (Category::Education, "Education Department"),
            (Category::Housing, "Housing Authority"),
            (Category::Other, "General Administration"),
        ]
        .into_iter()
        .map(|(category, name)| (category, name.to_string()))
        .collect();

        Self::new(departments, "General Administration")
    }
}

// Checked in order; the first group with a hit decides the category
const CATEGORY_KEYWORDS: [(Category, &[&str]); 6] = [
    (Category::Sanitation, &["garbage", "waste", "smell"]),
    (Category::WaterSupply, &["water", "pipe", "supply"]),
    (Category::Electricity, &["electricity", "light", "power"]),
    (Category::Roads, &["road", "pothole", "accident"]),
    (Category::PublicSafety, &["safety", "police", "crime"]),
    (Category::Healthcare, &["hospital", "health", "doctor"]),
];

/// Suggest a category from the grievance text
pub fn suggest_category(text: &str) -> Category {
    let text = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriorityTier::Low => "low",
            PriorityTier::Medium => "medium",
            PriorityTier::High => "high",
        })
    }
}

/// Priority from urgency and image severity
pub fn priority_tier(analysis: &GrievanceAnalysis, thresholds: &PriorityThresholds) -> PriorityTier {
    let urgency = analysis.overall_urgency.value();
    let severity = analysis.overall_severity;

    if urgency >= thresholds.high_urgency || severity == OverallSeverity::High {
        PriorityTier::High
    } else if urgency <= thresholds.low_urgency
        && (severity == OverallSeverity::Low || analysis.image_analyses.is_empty())
    {
        PriorityTier::Low
    } else {
        PriorityTier::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageDecision {
    pub category: Category,
    pub department: String,
    pub priority: PriorityTier,
}

/// Assign department and priority for an analyzed grievance.
///
/// An explicit `category` wins over the keyword suggestion.
pub fn route(
    analysis: &GrievanceAnalysis,
    text: &str,
    category: Option<Category>,
    departments: &DepartmentTable,
    thresholds: &PriorityThresholds,
) -> TriageDecision {
    let category = category.unwrap_or_else(|| suggest_category(text));
    TriageDecision {
        category,
        department: departments.department(category).to_string(),
        priority: priority_tier(analysis, thresholds),
    }
}
