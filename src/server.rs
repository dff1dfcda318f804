use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::context::ExecutionContext;
use crate::routes;
use crate::state::AppState;

/// Serves until `signal` resolves. Pending invocations are cancelled as soon
/// as the signal fires, before in-flight requests are drained; the context is
/// torn down once the server has stopped.
pub async fn serve<F>(
    listener: TcpListener,
    context: Arc<ExecutionContext>,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = routes::router(AppState::new(Arc::clone(&context)));
    let draining = Arc::clone(&context);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            draining.begin_shutdown();
        })
        .await?;

    context.shutdown().await;
    Ok(())
}
