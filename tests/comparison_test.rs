// ABOUTME: End-to-end comparison tests against mock provider backends
// ABOUTME: Covers partial failure, eligibility, concurrency timing, and outcome bookkeeping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{
    answer, claude_body, credentials, gemini_body, openai_body, orchestrator, png_bytes,
    MockReply, MockServer,
};
use platewise::on_device::{CentroidClassifier, NutritionTable, OnDeviceAdapter};
use platewise::Orchestrator;
use platewise_core::{AnalysisError, AnalysisRequest, ProviderId, Rating};

fn photo() -> AnalysisRequest {
    AnalysisRequest::new(png_bytes(64, 48, [200, 30, 30]))
}

#[tokio::test]
async fn test_one_success_one_rate_limited() {
    let server = MockServer::start(vec![
        (
            ProviderId::Claude,
            MockReply::ok(claude_body(
                r#"{"foodName":"Apple","calorieEstimate":95,"rating":"green","reasoning":"A whole apple"}"#,
            )),
        ),
        (ProviderId::OpenAi, MockReply::status(429)),
    ])
    .await;
    let orchestrator = orchestrator(
        server.config(),
        credentials(&[ProviderId::Claude, ProviderId::OpenAi]),
    );

    let report = orchestrator
        .compare(&photo(), &[ProviderId::Claude, ProviderId::OpenAi])
        .await;

    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.failures.len(), 1);
    let success = &report.successes[0];
    assert_eq!(success.provider, ProviderId::Claude);
    assert_eq!(success.result.food_name, "Apple");
    assert_eq!(success.result.calorie_estimate, 95);
    assert_eq!(success.result.rating_category(), Rating::Green);
    assert_eq!(report.failures[0].provider, ProviderId::OpenAi);
    assert_eq!(report.failures[0].error, AnalysisError::RateLimited);
    assert!(report.failure_summary().is_none());
}

#[tokio::test]
async fn test_no_credentials_runs_only_on_device() {
    let server = MockServer::start(vec![
        (ProviderId::Claude, MockReply::ok(claude_body(&answer("Toast", 80, "yellow")))),
        (ProviderId::OpenAi, MockReply::ok(openai_body(&answer("Toast", 80, "yellow")))),
        (ProviderId::Gemini, MockReply::ok(gemini_body(&answer("Toast", 80, "yellow")))),
    ])
    .await;
    let classifier = CentroidClassifier::from_json(
        r#"{"labels": [
            {"label": "tomato_soup", "centroid": [0.78, 0.12, 0.12]},
            {"label": "rice", "centroid": [0.95, 0.95, 0.92]}
        ], "temperature": 0.05}"#,
    )
    .unwrap();
    let orchestrator = Orchestrator::new(
        server.config(),
        Arc::new(credentials(&[])),
        OnDeviceAdapter::with_classifier(Arc::new(classifier), NutritionTable::bundled().unwrap()),
    )
    .unwrap();

    assert_eq!(orchestrator.eligible_providers(), vec![ProviderId::OnDevice]);
    let report = orchestrator.compare_all(&photo()).await;

    assert_eq!(report.total(), 1);
    let success = report.success(ProviderId::OnDevice).unwrap();
    assert_eq!(success.result.food_name, "Tomato Soup");
    assert_eq!(success.result.calorie_estimate, 161);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_fenced_answer_decodes() {
    let fenced = format!("```json\n{}\n```", answer("Pad Thai", 630, "yellow"));
    let server = MockServer::start(vec![(ProviderId::Gemini, MockReply::ok(gemini_body(&fenced)))]).await;
    let orchestrator = orchestrator(server.config(), credentials(&[ProviderId::Gemini]));

    let outcome = orchestrator.analyze_with(ProviderId::Gemini, &photo()).await;
    assert!(outcome.is_success(), "{outcome:?}");

    let report = orchestrator.compare(&photo(), &[ProviderId::Gemini]).await;
    assert_eq!(report.successes[0].result.food_name, "Pad Thai");
    assert_eq!(report.successes[0].result.calorie_estimate, 630);
}

#[tokio::test]
async fn test_fan_out_is_concurrent() {
    let server = MockServer::start(vec![
        (
            ProviderId::Claude,
            MockReply::ok(claude_body(&answer("Salad", 300, "green")))
                .after(Duration::from_millis(100)),
        ),
        (
            ProviderId::OpenAi,
            MockReply::ok(openai_body(&answer("Salad", 320, "green")))
                .after(Duration::from_millis(200)),
        ),
        (
            ProviderId::Gemini,
            MockReply::ok(gemini_body(&answer("Salad", 280, "green")))
                .after(Duration::from_millis(50)),
        ),
    ])
    .await;
    let orchestrator = orchestrator(
        server.config(),
        credentials(&[ProviderId::Claude, ProviderId::OpenAi, ProviderId::Gemini]),
    );
    let providers = [ProviderId::Claude, ProviderId::OpenAi, ProviderId::Gemini];

    // Warm up connections and the blocking pool
    let _ = orchestrator.compare(&photo(), &providers).await;

    let started = Instant::now();
    let report = orchestrator.compare(&photo(), &providers).await;
    let wall = started.elapsed();

    assert_eq!(report.successes.len(), 3);
    assert!(wall >= Duration::from_millis(200), "{wall:?}");
    assert!(wall < Duration::from_millis(340), "fan-out looks sequential: {wall:?}");

    let elapsed = |provider| report.success(provider).unwrap().elapsed;
    assert!(elapsed(ProviderId::Claude) >= Duration::from_millis(100));
    assert!(elapsed(ProviderId::OpenAi) >= Duration::from_millis(200));
    assert!(elapsed(ProviderId::Gemini) >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_every_dispatched_provider_reports_once() {
    let server = MockServer::start(vec![
        (ProviderId::Claude, MockReply::status(401)),
        (ProviderId::OpenAi, MockReply::status(503)),
        (
            ProviderId::Gemini,
            MockReply::ok(gemini_body("I think this is a sandwich, about 400 calories.")),
        ),
    ])
    .await;
    let orchestrator = orchestrator(
        server.config(),
        credentials(&[ProviderId::Claude, ProviderId::OpenAi, ProviderId::Gemini]),
    );

    let report = orchestrator.compare_all(&photo()).await;

    assert_eq!(report.total(), 4);
    assert!(report.successes.is_empty());
    let providers: Vec<_> = report.failures.iter().map(|f| f.provider).collect();
    assert_eq!(
        providers,
        vec![
            ProviderId::Claude,
            ProviderId::Gemini,
            ProviderId::OnDevice,
            ProviderId::OpenAi
        ]
    );
    assert_eq!(
        report.failure(ProviderId::Claude).unwrap().error,
        AnalysisError::InvalidCredential
    );
    assert_eq!(
        report.failure(ProviderId::OpenAi).unwrap().error,
        AnalysisError::ServerError(503)
    );
    assert!(matches!(
        report.failure(ProviderId::Gemini).unwrap().error,
        AnalysisError::DecodingError(_)
    ));
    assert_eq!(
        report.failure(ProviderId::OnDevice).unwrap().error,
        AnalysisError::ModelUnavailable
    );

    let summary = report.failure_summary().unwrap();
    assert_eq!(summary.lines().count(), 4);
    assert!(summary.contains("Server error: 503"));
}

#[tokio::test]
async fn test_one_slow_provider_does_not_skew_others() {
    let server = MockServer::start(vec![
        (
            ProviderId::Claude,
            MockReply::status(500).after(Duration::from_millis(250)),
        ),
        (ProviderId::Gemini, MockReply::ok(gemini_body(&answer("Ramen", 550, "yellow")))),
    ])
    .await;
    let orchestrator = orchestrator(
        server.config(),
        credentials(&[ProviderId::Claude, ProviderId::Gemini]),
    );

    let report = orchestrator
        .compare(&photo(), &[ProviderId::Claude, ProviderId::Gemini])
        .await;

    let gemini = report.success(ProviderId::Gemini).unwrap();
    assert!(gemini.elapsed < Duration::from_millis(200), "{:?}", gemini.elapsed);
    assert_eq!(
        report.failure(ProviderId::Claude).unwrap().error,
        AnalysisError::ServerError(500)
    );
}

#[tokio::test]
async fn test_abandoned_comparison_discards_late_outcomes() {
    let server = MockServer::start(vec![(
        ProviderId::OpenAi,
        MockReply::ok(openai_body(&answer("Pizza", 285, "red"))).after(Duration::from_millis(300)),
    )])
    .await;
    let orchestrator = orchestrator(server.config(), credentials(&[ProviderId::OpenAi]));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        orchestrator.compare(&photo(), &[ProviderId::OpenAi]),
    )
    .await;
    assert!(abandoned.is_err());

    // The detached task still completes its request
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(server.requests_for(ProviderId::OpenAi).len(), 1);

    // A new comparison starts fresh
    let report = orchestrator.compare(&photo(), &[ProviderId::OpenAi]).await;
    assert_eq!(report.successes.len(), 1);
}

#[tokio::test]
async fn test_provider_timeout_only_when_configured() {
    let slow = || {
        MockReply::ok(gemini_body(&answer("Lasagna", 600, "red"))).after(Duration::from_millis(400))
    };

    // No timeout configured: a slow provider is waited for
    let server = MockServer::start(vec![(ProviderId::Gemini, slow())]).await;
    let unbounded = orchestrator(server.config(), credentials(&[ProviderId::Gemini]));
    assert!(unbounded.config().request_timeout.is_none());
    let report = unbounded.compare(&photo(), &[ProviderId::Gemini]).await;
    assert_eq!(report.successes.len(), 1);

    // Configured timeout bounds the same call
    let server = MockServer::start(vec![(ProviderId::Gemini, slow())]).await;
    let mut config = server.config();
    config.request_timeout = Some(Duration::from_millis(100));
    let bounded = orchestrator(config, credentials(&[ProviderId::Gemini]));
    let report = bounded.compare(&photo(), &[ProviderId::Gemini]).await;
    assert_eq!(
        report.failure(ProviderId::Gemini).unwrap().error,
        AnalysisError::NetworkError("request timed out".to_owned())
    );
}
