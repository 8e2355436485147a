/*!
 * End-to-end tests for document translation with a scripted provider
 */

use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use wintrans::app_config::Config;
use wintrans::app_controller::Controller;
use wintrans::errors::TranslationError;
use wintrans::file_utils::split_lines;
use wintrans::providers::mock::MockProvider;
use wintrans::translation::{CachedProvider, CheckpointManager, TranslatedPair};

use crate::common::{
    create_temp_dir, create_test_file, echo_responder, init_test_logging, sample_novel, window_from_prompt,
};

fn small_window_config() -> Config {
    init_test_logging();
    let mut config = Config::default();
    config.window.window_size = 25;
    config.window.context_before = 40;
    config.window.context_after = 30;
    config
}

fn not_cancelled() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[tokio::test]
async fn test_workflow_run_withEchoProvider_shouldCoverEveryLine() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "novel.txt", sample_novel()).unwrap();
    let controller = Controller::with_config(small_window_config()).unwrap();
    let paths = controller.resolve_paths(input, None, None);
    let mock = MockProvider::with_responder(echo_responder);

    let summary = controller
        .run_with_provider(mock.clone(), &paths, not_cancelled())
        .await
        .unwrap();

    assert_eq!(summary.total_lines, 7);
    assert_eq!(summary.lines_translated, 7);
    assert_eq!(summary.terms_added, 1);
    // The first window holds the blank line, so its counts cannot match
    assert_eq!(summary.fallback_merges, 1);

    let state = CheckpointManager::new(&paths.output, &paths.terms, "vi", "zh").load().unwrap();
    assert_eq!(state.resume_index(), 7);
    assert_eq!(state.pairs.last(), Some(&TranslatedPair::new("Lan về nhà.", "译:Lan về nhà.")));
    assert_eq!(state.terms.get("Minh").unwrap().target, "阿明");

    // Once learned, the term is offered for every window mentioning it
    let prompts = mock.prompts();
    let with_minh: Vec<&String> = prompts
        .iter()
        .skip(1)
        .filter(|p| window_from_prompt(p).iter().any(|l| l.contains("Minh")))
        .collect();
    assert!(!with_minh.is_empty());
    assert!(with_minh.iter().all(|p| p.contains("## 术语表\nMinh -> 阿明")));
}

#[tokio::test]
async fn test_workflow_run_afterProviderFailure_shouldResumeAtNextWindow() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "novel.txt", sample_novel()).unwrap();
    let controller = Controller::with_config(small_window_config()).unwrap();
    let paths = controller.resolve_paths(input, None, None);

    // Two windows succeed, then the queue runs dry
    let first = MockProvider::scripted([
        MockProvider::format_reply(&["第一章 阿明去市场。"], &[("Minh", "阿明")]),
        MockProvider::format_reply(&["阿明在河内遇见兰。"], &[("Lan", "兰")]),
    ]);
    let result = controller.run_with_provider(first, &paths, not_cancelled()).await;
    let error = result.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TranslationError>(),
        Some(TranslationError::Provider(_))
    ));

    let lines = split_lines(sample_novel());
    let checkpoint = CheckpointManager::new(&paths.output, &paths.terms, "vi", "zh");
    let saved = checkpoint.load().unwrap();
    assert_eq!(saved.resume_index(), 4);
    assert_eq!(saved.terms.len(), 2);

    let second = MockProvider::with_responder(echo_responder);
    let summary = controller
        .run_with_provider(second.clone(), &paths, not_cancelled())
        .await
        .unwrap();

    assert_eq!(summary.resumed_from, 4);
    assert_eq!(summary.lines_translated, 3);
    assert_eq!(window_from_prompt(&second.prompts()[0]), vec![lines[4].clone()]);
    assert!(second.prompts()[0].contains("阿明在河内遇见兰。"));

    let finished = checkpoint.load().unwrap();
    assert_eq!(finished.resume_index(), lines.len());
    assert_eq!(&finished.pairs[..saved.pairs.len()], &saved.pairs[..]);
}

#[tokio::test]
async fn test_workflow_run_whenAlreadyComplete_shouldNotCallProvider() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "novel.txt", sample_novel()).unwrap();
    let controller = Controller::with_config(small_window_config()).unwrap();
    let paths = controller.resolve_paths(input, None, None);

    controller
        .run_with_provider(MockProvider::with_responder(echo_responder), &paths, not_cancelled())
        .await
        .unwrap();
    let before = fs::read_to_string(&paths.output).unwrap();

    let idle = MockProvider::failing();
    let summary = controller
        .run_with_provider(idle.clone(), &paths, not_cancelled())
        .await
        .unwrap();

    assert_eq!(summary.windows, 0);
    assert_eq!(idle.call_count(), 0);
    assert_eq!(fs::read_to_string(&paths.output).unwrap(), before);
}

#[tokio::test]
async fn test_workflow_run_withWarmCache_shouldReproduceOutputWithoutRequests() {
    let dir = create_temp_dir().unwrap();
    let cache_dir = dir.path().join("cache");
    let input = create_test_file(dir.path(), "novel.txt", sample_novel()).unwrap();
    let controller = Controller::with_config(small_window_config()).unwrap();

    let first_paths = controller.resolve_paths(input.clone(), None, None);
    let warm = Arc::new(CachedProvider::new(MockProvider::with_responder(echo_responder), &cache_dir));
    controller
        .run_with_provider(Arc::clone(&warm), &first_paths, not_cancelled())
        .await
        .unwrap();
    assert_eq!(warm.stats().hits, 0);

    let second_paths = controller.resolve_paths(
        input,
        Some(dir.path().join("again.json")),
        Some(dir.path().join("again.terms.json")),
    );
    let offline = MockProvider::failing();
    let cached = Arc::new(CachedProvider::new(offline.clone(), &cache_dir));
    controller
        .run_with_provider(Arc::clone(&cached), &second_paths, not_cancelled())
        .await
        .unwrap();

    assert_eq!(offline.call_count(), 0);
    assert_eq!(cached.stats().misses, 0);
    assert_eq!(
        fs::read_to_string(&first_paths.output).unwrap(),
        fs::read_to_string(&second_paths.output).unwrap()
    );
}

#[tokio::test]
async fn test_workflow_run_withCancelledFlag_shouldLeaveCheckpointUntouched() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "novel.txt", sample_novel()).unwrap();
    let controller = Controller::with_config(small_window_config()).unwrap();
    let paths = controller.resolve_paths(input, None, None);

    let result = controller
        .run_with_provider(
            MockProvider::with_responder(echo_responder),
            &paths,
            Arc::new(AtomicBool::new(true)),
        )
        .await;

    assert!(matches!(
        result.unwrap_err().downcast_ref::<TranslationError>(),
        Some(TranslationError::Cancelled(0))
    ));
    assert!(!paths.output.exists());
}

#[tokio::test]
async fn test_workflow_run_withCustomLabels_shouldWriteThemAsKeys() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "story.txt", "Hello\n").unwrap();

    let mut config = Config::default();
    config.source_label = "en".to_string();
    config.target_label = "fr".to_string();
    config.source_language = "English".to_string();
    config.target_language = "French".to_string();
    let controller = Controller::with_config(config).unwrap();
    let paths = controller.resolve_paths(input, None, None);
    assert!(paths.output.ends_with("story.fr.json"));

    let mock = MockProvider::scripted([MockProvider::format_reply(&["Bonjour"], &[])]);
    controller
        .run_with_provider(mock.clone(), &paths, not_cancelled())
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(&paths.output).unwrap(),
        "[\n{\n\"en\": \"Hello\",\n\"fr\": \"Bonjour\"\n}\n]"
    );
    assert!(mock.prompts()[0].starts_with("将以下内容从English翻译成French"));
    assert!(mock.prompts()[0].contains("使用French的标点符号"));
}
