//! Show the aggregated interactions of one series.

use anyhow::Result;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::{api::Api, config::Config, ui};

#[derive(Debug, Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Likes")]
    likes: u64,
    #[tabled(rename = "Comments")]
    comments: usize,
}

/// One row per chapter/episode, in numeric chapter order, episodes last.
fn item_rows(stats: &Value) -> Vec<ItemRow> {
    let Some(map) = stats.as_object() else {
        return Vec::new();
    };

    let mut rows: Vec<ItemRow> = map
        .iter()
        .filter(|(key, _)| key.as_str() != "stats")
        .map(|(key, counters)| ItemRow {
            item: key.clone(),
            likes: counters.get("likes").and_then(Value::as_u64).unwrap_or(0),
            comments: counters
                .get("comments")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        })
        .collect();

    rows.sort_by(|a, b| {
        let key = |r: &ItemRow| (r.item.parse::<f64>().ok(), r.item.clone());
        match (key(a), key(b)) {
            ((Some(x), _), (Some(y), _)) => x.total_cmp(&y),
            ((Some(_), _), (None, _)) => std::cmp::Ordering::Less,
            ((None, _), (Some(_), _)) => std::cmp::Ordering::Greater,
            ((None, x), (None, y)) => x.cmp(&y),
        }
    });
    rows
}

pub async fn run(config: &Config, slug: &str) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let stats = ui::spin("Fetching stats...", api.series_stats(slug)).await?;

    if let Some(ratings) = stats.pointer("/stats/ratings") {
        let count = ratings.get("count").and_then(Value::as_u64).unwrap_or(0);
        let average = ratings.get("average").and_then(Value::as_f64);
        match average {
            Some(avg) => println!("{} {avg:.2}/10 ({count} ratings)", ui::bold("Rating:")),
            None => println!("{} none", ui::bold("Rating:")),
        }
    }

    let rows = item_rows(&stats);
    if rows.is_empty() {
        println!("No interactions recorded for {}", ui::bold(slug));
        return Ok(());
    }

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::context::TestContext;
    use serde_json::json;
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[test]
    fn rows_sort_chapters_numerically_then_episodes() {
        let stats = json!({
            "10": { "likes": 1, "comments": [] },
            "2": { "likes": 4, "comments": [{}, {}] },
            "ep-S1-1": { "likes": 7 },
            "stats": { "ratings": { "count": 1, "average": 9.0 } }
        });

        let rows = item_rows(&stats);
        let items: Vec<_> = rows.iter().map(|r| r.item.as_str()).collect();

        assert_eq!(items, vec!["2", "10", "ep-S1-1"]);
        assert_eq!(rows[0].comments, 2);
        assert_eq!(rows[2].likes, 7);
    }

    #[tokio::test]
    async fn fetches_public_stats_without_token() {
        let ctx = TestContext::new().await;

        Mock::given(method("GET"))
            .and(path("/api/series-stats"))
            .and(query_param("slug", "blue-box"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&ctx.mock_server)
            .await;

        run(&ctx.config, "blue-box").await.unwrap();
    }
}
