use serde_json::json;

const BASE: &str = "http://127.0.0.1:1111";

#[tokio::main]
async fn main() {
    let client = reqwest::Client::new();

    let added = client
        .post(format!("{BASE}/words"))
        .json(&json!({ "word": "rust" }))
        .send()
        .await
        .unwrap();
    println!("add word: {}", added.status());
    println!("{}\n", added.text().await.unwrap());

    let issued = client.get(format!("{BASE}/word")).send().await.unwrap();
    println!("issue: {}", issued.status());
    println!("{}\n", issued.text().await.unwrap());

    let answered = client
        .post(format!("{BASE}/answer"))
        .json(&json!({ "word": "cargo" }))
        .send()
        .await
        .unwrap();
    println!("answer: {}", answered.status());
    println!("{}\n", answered.text().await.unwrap());

    let chart = client
        .get(format!("{BASE}/chart/link?start=rust&end=cargo"))
        .send()
        .await
        .unwrap();
    println!("chart: {}", chart.status());
    println!("{}", chart.text().await.unwrap());
}
