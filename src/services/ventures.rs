//! Venture catalogue
//!
//! The portfolio is fixed at build time; pages and the sitemap read it from
//! here.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaType {
    Product,
    Service,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VentureStatus {
    Live,
    #[serde(rename = "In Development")]
    InDevelopment,
    Prototype,
    Scaling,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Stat {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Venture {
    pub slug: &'static str,
    pub title: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    /// Client-side icon name
    pub icon: &'static str,
    pub color: &'static str,
    pub features: &'static [&'static str],
    pub stats: &'static [Stat],
    pub cta: &'static str,
    pub schema_type: SchemaType,
    pub status: VentureStatus,
}

pub static VENTURES: &[Venture] = &[
    Venture {
        slug: "real-estate",
        title: "Zeengo Real Estate",
        tagline: "Trust & Transparency in Property Markets",
        description: "An AI-driven ecosystem connecting buyers, sellers, and verified brokers. We eliminate information asymmetry in the real estate market through verified listings, smart contracts, and data-driven valuation models.",
        icon: "Globe",
        color: "text-blue-400",
        features: &[
            "Verified Listings Only",
            "AI-Powered Valuation",
            "Smart Contract Integration",
            "Direct Broker Connection",
        ],
        stats: &[
            Stat { label: "Listings", value: "10k+" },
            Stat { label: "Cities", value: "12" },
            Stat { label: "Trust Score", value: "99%" },
        ],
        cta: "Find Your Property",
        schema_type: SchemaType::Service,
        status: VentureStatus::Scaling,
    },
    Venture {
        slug: "zeengo-gpt",
        title: "Zeengo GPT",
        tagline: "Conversational Intelligence for Enterprise",
        description: "Built on the WhatsApp Business API, Zeengo GPT enables enterprises to automate customer support, sales, and user engagement with human-like precision. It's not just a chatbot; it's a full-stack conversation engine.",
        icon: "Cpu",
        color: "text-purple-400",
        features: &[
            "WhatsApp API Native",
            "Sentiment Analysis",
            "Automated Sales Funnels",
            "24/7 Customer Engagement",
        ],
        stats: &[
            Stat { label: "Messages Processed", value: "1M+" },
            Stat { label: "Avg Response", value: "<1s" },
            Stat { label: "Conversion Lift", value: "35%" },
        ],
        cta: "Automate Your Business",
        schema_type: SchemaType::Product,
        status: VentureStatus::Live,
    },
    Venture {
        slug: "security-manpower",
        title: "Zeengo Security",
        tagline: "Premium Protection for Modern Assets",
        description: "Combining rigorously trained personnel with advanced surveillance technology. Zeengo Security provides comprehensive protection for corporate campuses, residential complexes, and high-value assets.",
        icon: "Shield",
        color: "text-red-400",
        features: &[
            "Verified Personnel",
            "Tech-Enabled Patrols",
            "24/7 Command Center",
            "Emergency Response Team",
        ],
        stats: &[
            Stat { label: "Guards Deployed", value: "500+" },
            Stat { label: "Sites Secured", value: "50+" },
            Stat { label: "Incidents Prevented", value: "99%" },
        ],
        cta: "Secure Your Assets",
        schema_type: SchemaType::Service,
        status: VentureStatus::Live,
    },
    Venture {
        slug: "yatree",
        title: "Yatree Mobility",
        tagline: "Safe, Compliant, Reliable Rides",
        description: "A secure, compliance-focused ride-sharing application designed to facilitate cost-effective commuting through real-time ride-matching and user-friendly interfaces.",
        icon: "Car",
        color: "text-green-400",
        features: &[
            "Real-time Ride Matching",
            "Fixed Pricing Model",
            "Background Verified Drivers",
            "Cost-Effective Commuting",
        ],
        stats: &[
            Stat { label: "Active Drivers", value: "2k+" },
            Stat { label: "Rides Completed", value: "50k+" },
            Stat { label: "User Rating", value: "4.8" },
        ],
        cta: "Ride with Yatree",
        schema_type: SchemaType::Service,
        status: VentureStatus::InDevelopment,
    },
    Venture {
        slug: "publications",
        title: "Zeengo Publications",
        tagline: "Knowledge for the Growth Mindset",
        description: "Expanding digital content creation through Zeengo publications, eBooks, and online platforms. We emphasize self-help, business strategy, personality development, and children's mindset growth.",
        icon: "BookOpen",
        color: "text-yellow-400",
        features: &[
            "Business Strategy",
            "Self-Help & Growth",
            "Children's Mindset",
            "Digital & Print Formats",
        ],
        stats: &[
            Stat { label: "Readers", value: "100k+" },
            Stat { label: "Titles", value: "25+" },
            Stat { label: "Subscribers", value: "15k" },
        ],
        cta: "Read Our Insights",
        schema_type: SchemaType::Product,
        status: VentureStatus::Scaling,
    },
];

pub fn all() -> &'static [Venture] {
    VENTURES
}

pub fn find(slug: &str) -> Option<&'static Venture> {
    VENTURES.iter().find(|v| v.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_slugs_are_unique() {
        let slugs: HashSet<_> = all().iter().map(|v| v.slug).collect();
        assert_eq!(slugs.len(), all().len());
        assert_eq!(all().len(), 5);
    }

    #[test]
    fn test_find() {
        assert_eq!(find("yatree").unwrap().title, "Yatree Mobility");
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_serializes_camel_case_with_status_labels() {
        let json = serde_json::to_value(find("yatree").unwrap()).unwrap();
        assert_eq!(json["schemaType"], "Service");
        assert_eq!(json["status"], "In Development");
        assert_eq!(json["stats"][2]["value"], "4.8");
        assert_eq!(json["features"].as_array().unwrap().len(), 4);
    }
}
