pub fn main() {
    env_logger::init();

    let api_key = std::env::var("ATTRIBUTION_API_KEY").unwrap();
    let page_url = std::env::var("PAGE_URL")
        .unwrap_or_else(|_| "https://example.com/landing?af=partner&source=newsletter".to_owned());

    let client = attribution::ClientConfig::from_api_key(api_key)
        .storage(attribution::InMemoryStore::new())
        .page(attribution::StaticPage::parse(&page_url, "").unwrap())
        .to_client()
        .unwrap();

    println!("Attribution: {:?}", client.attribution());

    // The second pageview is suppressed as a duplicate of the first one.
    for _ in 0..2 {
        match client.track_pageview(None) {
            Ok(outcome) => println!("Pageview: {:?}", outcome),
            Err(err) => println!("Failed to send pageview: {}", err),
        }
    }
}
