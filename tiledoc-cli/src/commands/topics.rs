use super::load_corpus;
use anyhow::Result;
use std::path::Path;

/// Print topics in documentation order with their functions.
pub fn list_topics(config_path: &Path) -> Result<()> {
    let (_, corpus) = load_corpus(config_path)?;

    for topic in corpus.topics() {
        let protocol = topic
            .protocol
            .map(|p| format!(" [{}]", p))
            .unwrap_or_default();
        println!("{} - {}{}", topic.id, topic.title, protocol);
        for function in topic.sorted_functions() {
            println!("    {}", function.name);
        }
    }
    Ok(())
}
