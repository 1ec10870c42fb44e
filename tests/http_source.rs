use filmdash::domain::{DashError, FetchError, FormatError};
use filmdash::record::{DatasetId, cell};
use filmdash::source::{DataSource, HttpSource, fetch_records};
use filmdash::stats::{CountryCount, StatsAggregator};
use mockito::Matcher;

#[tokio::test]
async fn fetches_dataset_records_in_column_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/data")
        .match_query(Matcher::UrlEncoded("type".into(), "ratings".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"Name":"Heat","Year":1995,"Rating":null},{"Name":"Ran","Year":"1985","Rating":4.5}]"#)
        .create_async()
        .await;

    let source = HttpSource::new(format!("{}/", server.url()));
    let records = source.fetch_dataset(&DatasetId::Ratings).await.unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].keys().collect::<Vec<_>>(),
        vec!["Name", "Year", "Rating"]
    );
    assert_eq!(cell(&records[0], "Year"), "1995");
    assert_eq!(cell(&records[0], "Rating"), "");
    assert_eq!(cell(&records[1], "Rating"), "4.5");
}

#[tokio::test]
async fn server_error_carries_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/data")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    let err = source.fetch_dataset(&DatasetId::Reviews).await.unwrap_err();
    assert!(matches!(
        err,
        DashError::Fetch(FetchError::Status { status: 500, .. })
    ));
    assert!(err.to_string().starts_with("HTTP error 500 from "));
}

#[tokio::test]
async fn null_body_is_an_empty_dataset() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/data")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("null")
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    let records = source.fetch_dataset(&DatasetId::Comments).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn malformed_payload_is_a_format_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/data")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"Name":"Heat"}"#)
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    let err = source.fetch_dataset(&DatasetId::Watched).await.unwrap_err();
    assert!(matches!(err, DashError::Format(FormatError::Payload(_))));
}

#[tokio::test]
async fn csv_files_are_fetched_as_text_and_parsed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/stats/likes.csv")
        .with_status(200)
        .with_body("Name, Year\nHeat, 1995\n\nRan, 1985\n")
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    let id = DatasetId::Csv("stats/likes.csv".into());
    let records = fetch_records(&source, &id).await.unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(cell(&records[1], "Year"), "1985");
}

#[tokio::test]
async fn movies_come_from_the_catalogue_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/movies")
        .with_status(200)
        .with_body(
            r#"[{"letterboxd_uri":"https://boxd.it/1","title":"Heat","runtime":170,"adult":false}]"#,
        )
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    let records = source.fetch_dataset(&DatasetId::Movies).await.unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(cell(&records[0], "title"), "Heat");
    assert_eq!(cell(&records[0], "runtime"), "170");
    assert_eq!(cell(&records[0], "adult"), "false");
}

#[tokio::test]
async fn statistics_endpoint_is_decoded() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/statistics")
        .with_status(200)
        .with_body(
            r#"{"average_runtime":118.5,"top_production_countries":[{"country":"France","count":4},{"country":"Japan","count":2}]}"#,
        )
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    let stats = source.fetch_statistics().await.unwrap();
    assert_eq!(stats.average_runtime, Some(118.5));
    assert_eq!(
        stats.top_production_countries,
        Some(vec![
            CountryCount {
                country: "France".into(),
                count: 4
            },
            CountryCount {
                country: "Japan".into(),
                count: 2
            },
        ])
    );

    let mut aggregator = StatsAggregator::new();
    aggregator.compute_server_stats(&stats);
    assert_eq!(
        aggregator.slots().top_countries.as_deref(),
        Some("France (4), Japan (2)")
    );
}

#[tokio::test]
async fn failing_statistics_endpoint_leaves_slots_unset() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/statistics")
        .with_status(500)
        .with_body(r#"{"error": "boom"}"#)
        .create_async()
        .await;

    let source = HttpSource::new(server.url());
    assert!(matches!(
        source.fetch_statistics().await,
        Err(DashError::Fetch(FetchError::Status { status: 500, .. }))
    ));

    let reported = StatsAggregator::load_server_statistics(&source).await;
    let mut aggregator = StatsAggregator::new();
    aggregator.compute_server_stats(&reported);
    assert_eq!(aggregator.slots().average_runtime, None);
    assert_eq!(aggregator.slots().top_countries, None);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Nothing listens on the discard port.
    let source = HttpSource::new("http://127.0.0.1:9");
    let err = source.fetch_dataset(&DatasetId::Watched).await.unwrap_err();
    assert!(matches!(err, DashError::Fetch(FetchError::Transport { .. })));
}
