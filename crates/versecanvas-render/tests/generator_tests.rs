#![cfg(unix)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use versecanvas_render::{
    create_generator, GenerationRequest, GeneratorConfig, GeneratorError, GeneratorKind,
    ImageGenerator, OutputCallback, OutputStream,
};

/// Helper: a command generator running an inline shell script.
fn shell_generator(script: &str) -> Box<dyn ImageGenerator> {
    create_generator(
        GeneratorKind::Command,
        Some(PathBuf::from("sh")),
        vec![
            "-c".to_string(),
            script.to_string(),
            "sh".to_string(),
            "{output}".to_string(),
            "{prompt}".to_string(),
        ],
    )
    .unwrap()
}

fn request(dir: &TempDir) -> GenerationRequest {
    GenerationRequest::new(
        "A child with dark hair, style: sketch".to_string(),
        512,
        512,
        dir.path().join("image.png"),
    )
}

#[tokio::test]
async fn test_command_generator_writes_image() {
    let dir = TempDir::new().unwrap();
    let generator = shell_generator(r#"echo "rendering: $2"; printf 'PNG' > "$1""#);
    let config = GeneratorConfig::new(dir.path().to_path_buf());

    let image = generator.generate(&request(&dir), &config).await.unwrap();

    assert_eq!(image.path, dir.path().join("image.png"));
    assert_eq!((image.width, image.height), (512, 512));
    assert_eq!(
        image.output.stdout,
        "rendering: A child with dark hair, style: sketch"
    );
    assert_eq!(std::fs::read(&image.path).unwrap(), b"PNG");
}

#[tokio::test]
async fn test_command_generator_streams_lines() {
    let dir = TempDir::new().unwrap();
    let generator =
        shell_generator(r#"echo step 1; echo warn >&2; echo step 2; printf x > "$1""#);
    let config = GeneratorConfig::new(dir.path().to_path_buf());

    let seen: Arc<Mutex<Vec<(OutputStream, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: OutputCallback = Arc::new(move |stream: OutputStream, line: &str| {
        sink.lock().unwrap().push((stream, line.to_string()));
    });

    generator
        .generate_with_callback(&request(&dir), &config, Some(callback))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let stdout: Vec<&str> = seen
        .iter()
        .filter(|(s, _)| *s == OutputStream::Stdout)
        .map(|(_, l)| l.as_str())
        .collect();
    assert_eq!(stdout, vec!["step 1", "step 2"]);
    assert!(seen
        .iter()
        .any(|(s, l)| *s == OutputStream::Stderr && l == "warn"));
}

#[tokio::test]
async fn test_non_zero_exit_is_execution_failure() {
    let dir = TempDir::new().unwrap();
    let generator = shell_generator("echo 'model not loaded' >&2; exit 3");
    let config = GeneratorConfig::new(dir.path().to_path_buf());

    let err = generator.generate(&request(&dir), &config).await.unwrap_err();
    match err {
        GeneratorError::ExecutionFailed(msg) => {
            assert_eq!(msg, "exit code 3: model not loaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_image_is_reported() {
    let dir = TempDir::new().unwrap();
    let generator = shell_generator("true");
    let config = GeneratorConfig::new(dir.path().to_path_buf());

    let err = generator.generate(&request(&dir), &config).await.unwrap_err();
    assert!(matches!(err, GeneratorError::MissingOutput(_)));
}

#[tokio::test]
async fn test_missing_binary_fails_to_spawn() {
    let dir = TempDir::new().unwrap();
    let generator = create_generator(
        GeneratorKind::Command,
        Some(dir.path().join("no-such-binary")),
        vec!["{prompt}".to_string()],
    )
    .unwrap();
    let config = GeneratorConfig::new(dir.path().to_path_buf());

    assert!(!generator.is_available().await);
    let err = generator.generate(&request(&dir), &config).await.unwrap_err();
    assert!(matches!(err, GeneratorError::SpawnFailed(_)));
}

#[tokio::test]
async fn test_template_without_prompt_is_config_error() {
    let dir = TempDir::new().unwrap();
    let generator = create_generator(
        GeneratorKind::Command,
        Some(PathBuf::from("sh")),
        vec!["-c".to_string(), "true".to_string()],
    )
    .unwrap();
    let config = GeneratorConfig::new(dir.path().to_path_buf());

    let err = generator.generate(&request(&dir), &config).await.unwrap_err();
    assert!(matches!(err, GeneratorError::ConfigError(_)));
}

#[test]
fn test_command_kind_requires_binary() {
    assert!(matches!(
        create_generator(GeneratorKind::Command, None, Vec::new()),
        Err(GeneratorError::ConfigError(_))
    ));
    assert!(create_generator(GeneratorKind::StableDiffusionCpp, None, Vec::new()).is_ok());
}
