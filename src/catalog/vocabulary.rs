/// Fixed word lists used to make synthesized traffic look realistic.
#[derive(Debug, Clone)]
pub struct ScenarioVocabulary {
    pub search_terms: Vec<&'static str>,
    pub categories: Vec<&'static str>,
    pub user_agents: Vec<&'static str>,
}

impl Default for ScenarioVocabulary {
    fn default() -> Self {
        Self {
            search_terms: vec![
                "laptop",
                "smartphone",
                "tablet",
                "headphones",
                "camera",
                "watch",
                "book",
                "shoes",
                "clothing",
                "electronics",
            ],
            categories: vec![
                "electronics",
                "clothing",
                "books",
                "home",
                "sports",
                "beauty",
                "automotive",
                "toys",
                "health",
                "garden",
            ],
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
                "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X)",
                "Mozilla/5.0 (Android 11; Mobile; rv:68.0) Gecko/68.0",
            ],
        }
    }
}
