/*!
 * Tests for reply parsing and prompt construction
 */

use wintrans::providers::Provider;
use wintrans::providers::mock::MockProvider;
use wintrans::translation::{ContextAssembler, ParsedResponse, Term, TermStore, TranslatedPair, TranslationPromptBuilder};

use crate::common::lines;

#[test]
fn test_parsedResponse_withReasoningBeforeReply_shouldIgnoreIt() {
    let reply = "<think>Người dịch cần giữ tên riêng.</think>\n```\n【译文】\n阿明去市场。\n【新术语】\nMinh - 阿明（人名）\nchợ - 市场\n```";
    let parsed = ParsedResponse::parse(reply);

    assert_eq!(parsed.lines, vec!["阿明去市场。"]);
    assert_eq!(
        parsed.terms,
        vec![Term::new("Minh", "阿明", "人名"), Term::new("chợ", "市场", "")]
    );
}

#[test]
fn test_parsedResponse_withEmptyTranslationBlock_shouldYieldNoLines() {
    let parsed = ParsedResponse::parse("```\n【译文】\n\n【新术语】\n```");
    assert!(parsed.lines.is_empty());
    assert!(parsed.terms.is_empty());
}

#[test]
fn test_parsedResponse_withTruncatedReply_shouldKeepWhatArrived() {
    let parsed = ParsedResponse::parse("```\n【译文】\n第一行\n第二");
    assert_eq!(parsed.lines, vec!["第一行", "第二"]);
}

#[test]
fn test_termStore_mergeParsedTerms_shouldKeepFirstTranslation() {
    let mut store = TermStore::new();
    store.merge(ParsedResponse::parse("【译文】\nx\n【新术语】\nLan - 兰\n```").terms);
    let added = store.merge(ParsedResponse::parse("【译文】\nx\n【新术语】\nLan - 澜\nHùng - 雄\n```").terms);

    assert_eq!(added, 1);
    assert_eq!(store.get("Lan").unwrap().target, "兰");
    assert_eq!(store.iter().map(|t| t.source.as_str()).collect::<Vec<_>>(), vec!["Lan", "Hùng"]);
}

#[test]
fn test_promptBuilder_withStoreAndContext_shouldRenderFullPrompt() {
    let input = lines(&["Minh đi chợ.", "Lan ở nhà.", "Trời mưa."]);
    let translated = vec![TranslatedPair::new("Minh đi chợ.", "阿明去市场。")];
    let store = TermStore::from_terms(vec![Term::new("Lan", "兰", ""), Term::new("Hùng", "雄", "")]);

    let window = &input[1..2];
    let context = ContextAssembler::new(384, 384).assemble(&input, &translated, 1, window);
    let prompt = TranslationPromptBuilder::new("越南语", "中文")
        .with_glossary(store.lookup(window))
        .with_context(&context)
        .with_window(window)
        .build();

    let expected = "将以下内容从越南语翻译成中文，并遵守以下要求：\n\
        使用中文标点：，。！？：；“”……——（）【】等等\n\
        翻译时，译文尽量和原文行数相等。\n\
        如果遇到需要翻译时保持一致且不在术语表中的新术语，比如人名地名专名等，则将其一并输出。\n\
        \n\
        \n## 术语表\n\
        Lan -> 兰\n\
        \n## 前文（仅供参考，不用翻译）\n```\n\
        Minh đi chợ.\n\
        阿明去市场。\n\
        ```\n\
        \n## 待翻译内容\n```\n\
        Lan ở nhà.\n\
        ```\n\
        \n## 后文（仅供参考，不用翻译）\n```\n\
        Trời mưa.\n\
        ```\n\
        \n按以下格式输出（【新术语】如果没有可以留空）：\n\
        ```\n\
        【译文】\n\
        line1\n\
        line2\n\
        ...\n\
        【新术语】\n\
        原文1 - 译文1\n\
        原文2 - 译文2\n\
        ...\n\
        ```";
    assert_eq!(prompt, expected);
}

#[test]
fn test_parsedResponse_ofMockReply_shouldRecoverLinesAndTerms() {
    let provider = MockProvider::scripted([MockProvider::format_reply(&["你好", "再见"], &[("Minh", "阿明")])]);
    let reply = tokio_test::block_on(async { provider.generate("prompt").await }).unwrap();

    let parsed = ParsedResponse::parse(&reply);
    assert_eq!(parsed.lines, vec!["你好", "再见"]);
    assert_eq!(parsed.terms, vec![Term::new("Minh", "阿明", "")]);
}
