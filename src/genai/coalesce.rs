use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use super::client::GenerativeClient;
use super::error::GenAiError;
use super::transport::{HttpTransport, Transport};

type SharedAnswer = Shared<BoxFuture<'static, Result<String, GenAiError>>>;

/// Lets identical prompts that are in flight at the same time share a single
/// attempt sequence.
pub struct CoalescingClient<T = HttpTransport> {
    client: Arc<GenerativeClient<T>>,
    in_flight: Arc<StdMutex<HashMap<String, SharedAnswer>>>,
}

impl<T: Transport> CoalescingClient<T> {
    pub fn new(client: GenerativeClient<T>) -> Self {
        Self {
            client: Arc::new(client),
            in_flight: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    pub fn inner(&self) -> &GenerativeClient<T> {
        &self.client
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GenAiError> {
        let key = prompt.trim().to_string();

        let answer = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.get(&key) {
                Some(pending) => {
                    log::debug!("Joining in-flight assistant request");
                    pending.clone()
                }
                None => {
                    // The attempt sequence runs on its own task so it finishes
                    // and leaves the registry even when every waiter is gone.
                    let guard = InFlightGuard {
                        registry: Arc::clone(&self.in_flight),
                        key: key.clone(),
                    };
                    let client = Arc::clone(&self.client);
                    let task = tokio::spawn(async move {
                        let result = client.generate(&guard.key).await;
                        drop(guard);
                        result
                    });
                    let pending = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(GenAiError::Transport(format!("assistant task failed: {e}")))
                        })
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        answer.await
    }
}

/// Removes a prompt from the registry once its sequence ends, panics included.
struct InFlightGuard {
    registry: Arc<StdMutex<HashMap<String, SharedAnswer>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.key);
    }
}

fn lock<V>(map: &StdMutex<V>) -> MutexGuard<'_, V> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::client::tests::{settings, Scripted, ANSWER};
    use crate::genai::transport::RawResponse;
    use std::time::Duration;

    fn slow(outcomes: Vec<Result<RawResponse, GenAiError>>) -> Scripted {
        let mut transport = Scripted::new(outcomes);
        transport.latency = Duration::from_millis(300);
        transport
    }

    #[tokio::test(start_paused = true)]
    async fn identical_prompts_share_one_request() {
        let client = CoalescingClient::new(GenerativeClient::new(
            slow(vec![Ok(RawResponse::new(200, ANSWER))]),
            settings(),
        ));

        let (a, b) = tokio::join!(
            client.generate("Where is the ISS?"),
            client.generate("  Where is the ISS?")
        );
        assert_eq!(a.unwrap(), "Over the Pacific.");
        assert_eq!(b.unwrap(), "Over the Pacific.");
        assert_eq!(client.inner().transport_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_prompts_are_independent() {
        let client = CoalescingClient::new(GenerativeClient::new(
            slow(vec![
                Ok(RawResponse::new(200, ANSWER)),
                Ok(RawResponse::new(200, ANSWER)),
            ]),
            settings(),
        ));

        let (a, b) = tokio::join!(client.generate("one"), client.generate("two"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(client.inner().transport_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_shared_and_cleared() {
        let client = CoalescingClient::new(GenerativeClient::new(
            slow(vec![
                Ok(RawResponse::new(400, "nope")),
                Ok(RawResponse::new(200, ANSWER)),
            ]),
            settings(),
        ));

        let (a, b) = tokio::join!(client.generate("hi"), client.generate("hi"));
        assert_eq!(a, b);
        assert!(matches!(a, Err(GenAiError::Status { status: 400, .. })));

        // the finished sequence is gone, so the next ask goes out again
        assert_eq!(client.generate("hi").await.unwrap(), "Over the Pacific.");
        assert_eq!(client.inner().transport_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_request_still_leaves_registry() {
        let client = CoalescingClient::new(GenerativeClient::new(
            slow(vec![Ok(RawResponse::new(200, ANSWER))]),
            settings(),
        ));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), client.generate("abandoned")).await;
        assert!(abandoned.is_err());
        assert_eq!(lock(&client.in_flight).len(), 1);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(lock(&client.in_flight).is_empty());
        assert_eq!(client.inner().transport_calls(), 1);
    }
}
