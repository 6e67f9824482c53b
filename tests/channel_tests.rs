//! Integration tests for the channel draining helpers.

use collection::channel::{
    ChannelError, ChannelFn, StreamError, channel_fn_count, channel_fn_list, channel_fn_map,
    channel_fn_set, stream_list,
};
use collection::context::{Context, ContextError};
use collection::set::Set;
use rstest::rstest;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestError(&'static str);

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.0)
    }
}

impl Error for TestError {}

async fn send_all<T>(sender: &mpsc::Sender<T>, items: Vec<T>) -> Result<(), TestError> {
    for item in items {
        sender
            .send(item)
            .await
            .map_err(|_| TestError("receiver dropped"))?;
    }
    Ok(())
}

// =============================================================================
// Count
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_count_without_items_is_zero() {
    let count = channel_fn_count::<u8, TestError, _, _>(
        &Context::background(),
        |_ctx, _sender| async { Ok(()) },
    )
    .await;
    assert_eq!(count, Ok(0));
}

#[rstest]
#[tokio::test]
async fn test_count_emitted_items() {
    let count = channel_fn_count(&Context::background(), |_ctx, sender| async move {
        send_all(&sender, vec!["a", "b", "c"]).await
    })
    .await;
    assert_eq!(count, Ok(3));
}

#[rstest]
#[tokio::test]
async fn test_count_reports_producer_error() {
    let result = channel_fn_count(&Context::background(), |_ctx, sender| async move {
        send_all(&sender, vec![1]).await?;
        Err(TestError("producer error"))
    })
    .await;

    let error = result.unwrap_err();
    let message = error.to_string();
    assert!(message.contains("count channel failed"), "{message}");
    assert!(message.contains("producer error"), "{message}");
    assert_eq!(error.into_source(), Some(TestError("producer error")));
}

// =============================================================================
// List
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_list_keeps_emission_order() {
    let items = ChannelFn::with_capacity(4)
        .list(&Context::background(), |_ctx, sender| async move {
            send_all(&sender, (0..10).collect::<Vec<i32>>()).await
        })
        .await;
    assert_eq!(items, Ok((0..10).collect::<Vec<_>>()));
}

#[rstest]
#[tokio::test]
async fn test_list_error_returns_no_partial_result() {
    let result = channel_fn_list(&Context::background(), |_ctx, sender| async move {
        send_all(&sender, vec![1, 2]).await?;
        Err(TestError("boom"))
    })
    .await;

    assert_eq!(
        result,
        Err(ChannelError::Producer {
            operation: "convert channel to list",
            source: TestError("boom"),
        })
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_list_returns_promptly_when_cancelled() {
    let (ctx, cancel) = Context::background().with_cancel();
    let stopped = Arc::new(AtomicBool::new(false));
    let producer_stopped = Arc::clone(&stopped);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
    });

    let result = channel_fn_list(&ctx, move |_ctx, sender| async move {
        sender.send(1).await.map_err(|_| TestError("closed"))?;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        producer_stopped.store(true, Ordering::SeqCst);
        Ok::<(), TestError>(())
    })
    .await;

    canceller.await.unwrap();
    let error = result.unwrap_err();
    assert_eq!(error.cancellation(), Some(ContextError::Canceled));
    assert_eq!(
        error.to_string(),
        "convert channel to list failed: context canceled"
    );
    assert!(!stopped.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_list_reports_deadline() {
    let (ctx, _cancel) = Context::background().with_timeout(Duration::from_millis(5));

    let result = channel_fn_list::<u8, TestError, _, _>(&ctx, |ctx, _sender| async move {
        ctx.done().await;
        Ok::<(), TestError>(())
    })
    .await;

    assert_eq!(
        result.unwrap_err().cancellation(),
        Some(ContextError::DeadlineExceeded)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_count_returns_promptly_when_cancelled() {
    let (ctx, cancel) = Context::background().with_cancel();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
    });

    let result = channel_fn_count(&ctx, |_ctx, sender| async move {
        send_all(&sender, vec![1, 2]).await?;
        std::future::pending::<()>().await;
        Ok::<(), TestError>(())
    })
    .await;

    canceller.await.unwrap();
    let error = result.unwrap_err();
    assert_eq!(error.cancellation(), Some(ContextError::Canceled));
    assert_eq!(error.operation(), "count channel");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_count_reports_producer_error_while_sender_clone_lives() {
    let (ctx, _cancel) = Context::background().with_timeout(Duration::from_secs(5));

    let result = channel_fn_count(&ctx, |_ctx, sender| async move {
        let detached = sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            drop(detached);
        });
        send_all(&sender, vec![1]).await?;
        Err(TestError("producer failed"))
    })
    .await;

    assert_eq!(
        result,
        Err(ChannelError::Producer {
            operation: "count channel",
            source: TestError("producer failed"),
        })
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_list_completes_when_producer_returns_with_sender_clone_alive() {
    let (ctx, _cancel) = Context::background().with_timeout(Duration::from_secs(5));

    let result = ChannelFn::with_capacity(4)
        .list(&ctx, |_ctx, sender| async move {
            let detached = sender.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(detached);
            });
            send_all(&sender, vec!["a", "b", "c"]).await
        })
        .await;

    assert_eq!(result, Ok(vec!["a", "b", "c"]));
}

// =============================================================================
// Map
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_map_applies_function_in_order() {
    let mut seen = Vec::new();
    let result = channel_fn_map(
        &Context::background(),
        |_ctx, sender| async move { send_all(&sender, vec![1, 2, 3]).await },
        |_ctx, item| {
            seen.push(item);
            async { Ok::<(), TestError>(()) }
        },
    )
    .await;

    assert_eq!(result, Ok(()));
    assert_eq!(seen, vec![1, 2, 3]);
}

#[rstest]
#[tokio::test]
async fn test_map_function_error_is_wrapped() {
    let result = channel_fn_map(
        &Context::background(),
        |_ctx, sender| async move { send_all(&sender, vec![1, 2, 3]).await },
        |_ctx, item| async move {
            if item == 2 {
                Err(TestError("bad item"))
            } else {
                Ok(())
            }
        },
    )
    .await;

    let error = result.unwrap_err();
    assert_eq!(error.to_string(), "map channel failed: map failed: bad item");
    assert!(matches!(error, ChannelError::Consumer { .. }));
}

#[rstest]
#[tokio::test]
async fn test_map_function_error_cancels_producer_context() {
    let (observed_sender, mut observed) = mpsc::channel(1);

    let result = channel_fn_map(
        &Context::background(),
        move |ctx, sender| async move {
            sender.send(1).await.map_err(|_| TestError("closed"))?;
            let cause = ctx.done().await;
            let _ = observed_sender.send(cause).await;
            Ok::<(), TestError>(())
        },
        |_ctx, _item: i32| async { Err::<(), TestError>(TestError("stop")) },
    )
    .await;

    assert!(matches!(result, Err(ChannelError::Consumer { .. })));
    // The producer is aborted right after its context is cancelled, so it may
    // not get to report back.
    if let Some(cause) = observed.recv().await {
        assert_eq!(cause, ContextError::Canceled);
    }
}

#[rstest]
#[tokio::test]
async fn test_map_reports_producer_error() {
    let result = channel_fn_map(
        &Context::background(),
        |_ctx, sender| async move {
            send_all(&sender, vec![1]).await?;
            Err(TestError("upstream"))
        },
        |_ctx, _item| async { Ok::<(), TestError>(()) },
    )
    .await;

    assert_eq!(
        result,
        Err(ChannelError::Producer {
            operation: "map channel",
            source: TestError("upstream"),
        })
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_map_returns_promptly_when_cancelled() {
    let (ctx, cancel) = Context::background().with_cancel();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
    });
    let mut mapped = Vec::new();

    let result = channel_fn_map(
        &ctx,
        |_ctx, sender| async move {
            send_all(&sender, vec![1]).await?;
            std::future::pending::<()>().await;
            Ok::<(), TestError>(())
        },
        |_ctx, item| {
            mapped.push(item);
            async { Ok::<(), TestError>(()) }
        },
    )
    .await;

    canceller.await.unwrap();
    let error = result.unwrap_err();
    assert_eq!(error.cancellation(), Some(ContextError::Canceled));
    assert_eq!(error.operation(), "map channel");
    assert_eq!(mapped, vec![1]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_map_reports_producer_error_while_sender_clone_lives() {
    let (ctx, _cancel) = Context::background().with_timeout(Duration::from_secs(5));

    let result = channel_fn_map(
        &ctx,
        |_ctx, sender| async move {
            let detached = sender.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(detached);
            });
            send_all(&sender, vec![1, 2]).await?;
            Err(TestError("producer failed"))
        },
        |_ctx, _item| async { Ok::<(), TestError>(()) },
    )
    .await;

    assert_eq!(
        result,
        Err(ChannelError::Producer {
            operation: "map channel",
            source: TestError("producer failed"),
        })
    );
}

#[rstest]
#[tokio::test]
async fn test_map_prefers_finished_producer_error() {
    let result = channel_fn_map(
        &Context::background(),
        |_ctx, sender| async move {
            send_all(&sender, vec![1]).await?;
            Err(TestError("producer failed"))
        },
        |_ctx, _item: i32| async { Err::<(), TestError>(TestError("mapper failed")) },
    )
    .await;

    assert_eq!(
        result,
        Err(ChannelError::Producer {
            operation: "map channel",
            source: TestError("producer failed"),
        })
    );
}

// =============================================================================
// Set
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_set_collects_unique_items() {
    let set = Set::new();
    let received = channel_fn_set(
        &Context::background(),
        |_ctx, sender| async move { send_all(&sender, vec!["a", "b", "a"]).await },
        &set,
    )
    .await;

    assert_eq!(received, Ok(3));
    assert_eq!(set, Set::from(["a", "b"]));
}

#[rstest]
#[tokio::test]
async fn test_set_left_untouched_on_error() {
    let set = Set::from(["existing"]);
    let result = channel_fn_set(
        &Context::background(),
        |_ctx, sender| async move {
            send_all(&sender, vec!["new"]).await?;
            Err(TestError("broken"))
        },
        &set,
    )
    .await;

    assert_eq!(result.unwrap_err().operation(), "convert channel to set");
    assert_eq!(set, Set::from(["existing"]));
}

// =============================================================================
// Stream
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_stream_list_feeds_a_drain() {
    let result = channel_fn_list(&Context::background(), |ctx, sender| async move {
        stream_list(&ctx, ["x", "y"], &sender)
            .await
            .map_err(|_| TestError("stream failed"))
    })
    .await;

    assert_eq!(result, Ok(vec!["x", "y"]));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_stream_list_cancelled_while_blocked() {
    let (ctx, cancel) = Context::background().with_cancel();
    let (sender, _receiver) = mpsc::channel(1);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        cancel.cancel();
    });

    // Capacity one and nobody receiving: the second send blocks.
    let result = stream_list(&ctx, [1, 2, 3], &sender).await;

    canceller.await.unwrap();
    assert_eq!(result, Err(StreamError::Cancelled(ContextError::Canceled)));
}
