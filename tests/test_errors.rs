//! How failures in user code surface: which call reports them and how many
//! layers wrap the original error.

mod common;

use portico_command::{
    ArgumentKind, Command, CommandContext, CommandError, CommandManager, CommandMeta,
    CompletionError, GrammarNode, SuggestionContext, SuggestionError,
};

use common::{source, wrap_depth, Boom, MockRaw, MockSimple};

#[tokio::test]
async fn test_execute_async_completes_exceptionally_if_execute_throws() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("hello").build(),
            Command::simple(MockSimple::new().on_execute(|_| Err(Boom.into()))),
        )
        .unwrap();

    let handle = manager.execute_async(source(), "hello").unwrap();
    assert!(!handle.is_forwarded());
    let err = handle.join().await.unwrap_err();
    assert!(matches!(
        err,
        CompletionError::Failed(CommandError::ExecutionFailed { .. })
    ));
    assert_eq!(wrap_depth::<Boom>(&err), Some(2));
}

#[tokio::test]
async fn test_execute_removes_join_layer() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("hello").build(),
            Command::raw(MockRaw::new().on_execute(|_| Err(Boom.into()))),
        )
        .unwrap();

    let err = manager.execute(source(), "hello").await.unwrap_err();
    assert_eq!(err.alias(), "hello");
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_execute_throws_if_has_permission_throws() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("hello").build(),
            Command::raw(MockRaw::never_executed().on_permission(|_| Err(Boom.into()))),
        )
        .unwrap();

    let err = manager.execute_async(source(), "hello").unwrap_err();
    assert!(matches!(err, CommandError::PermissionCheckFailed { .. }));
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));

    let err = manager.execute(source(), "hello").await.unwrap_err();
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_offer_suggestions_completes_exceptionally_if_suggest_throws() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("hello").build(),
            Command::simple(MockSimple::never_executed().on_suggest(|_| Err(Boom.into()))),
        )
        .unwrap();

    let err = manager
        .offer_suggestions(source(), "hello ")
        .join()
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestionError::Failed(_)));
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_suggestions_fail_if_alias_permission_throws() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("hello").build(),
            Command::raw(MockRaw::never_executed().on_permission(|_| Err(Boom.into()))),
        )
        .unwrap();

    let err = manager.suggest(source(), "he").await.unwrap_err();
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_grammar_executor_failure_depths() {
    let manager = CommandManager::new();
    let root = GrammarNode::literal("fail").executes(|_ctx: CommandContext| async {
        Err::<(), _>(anyhow::Error::new(Boom))
    });
    manager
        .register(CommandMeta::for_grammar(&root).build(), Command::grammar(root))
        .unwrap();

    let err = manager
        .execute_async(source(), "fail")
        .unwrap()
        .join()
        .await
        .unwrap_err();
    assert_eq!(wrap_depth::<Boom>(&err), Some(2));

    let err = manager.execute(source(), "fail").await.unwrap_err();
    assert!(matches!(err, CommandError::ExecutionFailed { .. }));
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_grammar_requirement_failure_is_synchronous() {
    let manager = CommandManager::new();
    let root = GrammarNode::literal("guarded")
        .requires(|_source| Err(Boom.into()))
        .executes(|_ctx: CommandContext| async { Ok::<_, anyhow::Error>(()) });
    manager
        .register(CommandMeta::for_grammar(&root).alias("g").build(), Command::grammar(root))
        .unwrap();

    for line in ["guarded", "g"] {
        let err = manager.execute_async(source(), line).unwrap_err();
        assert!(matches!(err, CommandError::PermissionCheckFailed { .. }));
        assert_eq!(wrap_depth::<Boom>(&err), Some(1));
    }

    let err = manager.suggest(source(), "guarded ").await.unwrap_err();
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_grammar_provider_failure_is_wrapped_once() {
    let manager = CommandManager::new();
    let root = GrammarNode::literal("pick").then(
        GrammarNode::argument("thing", ArgumentKind::Word).suggests(|_ctx: SuggestionContext| async {
            Err::<Vec<String>, _>(anyhow::Error::new(Boom))
        }),
    );
    manager
        .register(CommandMeta::for_grammar(&root).build(), Command::grammar(root))
        .unwrap();

    let err = manager.suggest(source(), "pick ").await.unwrap_err();
    assert_eq!(wrap_depth::<Boom>(&err), Some(1));
}

#[tokio::test]
async fn test_failures_leave_manager_usable() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("bad").build(),
            Command::simple(MockSimple::new().on_execute(|_| Err(Boom.into()))),
        )
        .unwrap();
    let good = MockSimple::new();
    let stats = good.stats();
    manager
        .register(CommandMeta::builder("good").build(), Command::simple(good))
        .unwrap();

    for _ in 0..3 {
        assert!(manager.execute(source(), "bad").await.is_err());
        assert!(manager.execute(source(), "good").await.is_ok());
    }
    assert_eq!(stats.executed(), 3);
}

#[tokio::test]
async fn test_panicking_body_reports_aborted() {
    let manager = CommandManager::new();
    manager
        .register(
            CommandMeta::builder("panic").build(),
            Command::simple(MockSimple::new().on_execute(|_| panic!("body panicked"))),
        )
        .unwrap();

    let err = manager.execute(source(), "panic").await.unwrap_err();
    assert!(matches!(err, CommandError::Aborted { .. }));
    assert_eq!(err.alias(), "panic");
}
