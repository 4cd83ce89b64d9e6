//! Scripted director runs through the facade.

use eisenstein::{
    Director, DirectorConfig, DirectorState, EisensteinErrorKind, PromptSource, Script,
    StoryboardPipeline,
};

const DEMO: &str = include_str!("../../../demos/rainy_city.toml");

#[tokio::test]
async fn test_demo_script_refines_to_done() {
    let (driver, tools) = Script::parse(DEMO).unwrap().into_parts();
    let director = Director::new(
        driver,
        tools,
        StoryboardPipeline::default(),
        DirectorConfig::default(),
    )
    .unwrap();

    let report = director.run("A rainy city at night").await.unwrap();

    assert_eq!(report.state, DirectorState::Done);
    assert_eq!(report.prompts.len(), 3);
    assert_eq!(report.prompts[2].timestamp, "00:10");
    assert_eq!(report.prompts[2].mood, "melancholic");
    assert_eq!(report.quality_score, Some(0.85));
    assert_eq!(report.tool_calls, 4);
    assert!(!report.used_fallback);
    assert_eq!(director.driver().remaining(), 0);
    assert_eq!(director.pipeline().metrics().total_requests(), 2);
}

#[tokio::test]
async fn test_reconstructed_prompts_are_tagged() {
    let script = r#"
[[turns]]
content = ""
[[turns.tool_calls]]
id = "c1"
name = "refine_storyboard"

[[turns]]
content = "Done."

[[tools]]
name = "refine_storyboard"
outputs = ['{"scenes": ["A paper boat drifts down a flooded gutter"]}']
"#;
    let (driver, tools) = Script::parse(script).unwrap().into_parts();
    let pipeline = StoryboardPipeline::default();
    let director = Director::new(driver, tools, pipeline, DirectorConfig::default()).unwrap();

    let report = director.run("Rain").await.unwrap();
    assert_eq!(report.state, DirectorState::Done);
    assert_eq!(report.prompts[0].text, "A paper boat drifts down a flooded gutter");

    let (_, tools) = Script::parse(script).unwrap().into_parts();
    let output = tools
        .invoke("refine_storyboard", &serde_json::json!({}))
        .await
        .unwrap();
    let outcome = director.pipeline().process(&output);
    assert_eq!(
        outcome.document().unwrap().prompts()[0].source,
        Some(PromptSource::Reconstructed)
    );
}

#[tokio::test]
async fn test_script_running_out_is_model_error() {
    let script = r#"
[[turns]]
content = "Let me think."
"#;
    let (driver, tools) = Script::parse(script).unwrap().into_parts();
    let director = Director::new(
        driver,
        tools,
        StoryboardPipeline::default(),
        DirectorConfig::default(),
    )
    .unwrap();

    let err = director.run("Rain").await.unwrap_err();
    assert!(matches!(err.kind(), EisensteinErrorKind::Director(_)));
    assert!(err.to_string().contains("round 3"));
}
