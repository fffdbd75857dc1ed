use crate::models::{NodeType, Roadmap, RoadmapNode};

pub const ROOT_ID: &str = "root";

/// The tree every new session starts from.
pub fn default_roadmap() -> Roadmap {
    let mut root = RoadmapNode::new(ROOT_ID, "Technology Careers", NodeType::Root).with_content(
        "The starting point of your career roadmap. Chat about your interests to grow it.",
    );

    root.children = vec![
        RoadmapNode::new("ai", "AI & Machine Learning", NodeType::Category)
            .with_content(
                "Systems that learn from data, find patterns and make decisions with little human intervention.",
            )
            .with_resources(["Coursera Machine Learning", "Fast.ai", "DeepLearning.AI"]),
        RoadmapNode::new("web", "Web Development", NodeType::Category)
            .with_content("Building websites and web applications, from the browser to the server.")
            .with_resources(["MDN Web Docs", "The Odin Project", "freeCodeCamp"]),
        RoadmapNode::new("data", "Data Science", NodeType::Category)
            .with_content(
                "Programming, statistics and domain knowledge combined to extract insight from data.",
            )
            .with_resources(["Kaggle", "DataCamp", "R for Data Science"]),
        RoadmapNode::new("cloud", "Cloud Computing", NodeType::Category)
            .with_content("Running and operating software on managed infrastructure.")
            .with_resources(["AWS Skill Builder", "Microsoft Learn", "Google Cloud Skills Boost"]),
    ];

    for child in &mut root.children {
        child.parent_id = Some(ROOT_ID.to_string());
    }

    Roadmap { root }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roadmap_is_well_formed() {
        let tree = default_roadmap();
        assert!(tree.validate().is_ok());
        assert_eq!(tree.ids(), ["root", "ai", "web", "data", "cloud"]);
    }
}
