use crate::store::ControlState;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch::Receiver;
use tracing::instrument;

/// Writes a line for every status change until the store stops.
#[instrument(skip_all)]
pub async fn store_listener<W: AsyncWrite + Unpin>(mut rx: Receiver<ControlState>, mut out: W) -> std::io::Result<()> {
    let mut last_message = rx.borrow_and_update().status_message().to_string();

    while rx.changed().await.is_ok() {
        let line = {
            let state = rx.borrow_and_update();
            if state.status_message() == last_message {
                continue;
            }
            last_message = state.status_message().to_string();
            render(&state)
        };

        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

pub fn render(state: &ControlState) -> String {
    let color = state.selected_color();
    format!(
        "{} {} | color {} {} | intensity {}%\n",
        if state.busy() { "⏳" } else { "💡" },
        state.status_message(),
        color.name(),
        color.rgb(),
        (state.intensity() * 100.0) as i64
    )
}
