use std::future::Future;
use std::pin::Pin;

use ride_sim_core::{PersistError, TripPersistence, TripUpdate};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};
use tokio::sync::Mutex;

/// Persistence backend that appends every trip update as one JSON line
pub struct JsonLinesJournal<W> {
    out: Mutex<BufWriter<W>>,
}

impl JsonLinesJournal<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesJournal<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: Mutex::new(BufWriter::new(writer)),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().into_inner()
    }

    async fn append(&self, update: &TripUpdate) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(update).map_err(|e| PersistError::Rejected(e.to_string()))?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line)
            .await
            .map_err(|e| PersistError::Transport(e.to_string()))?;

        // Each line is a complete record for whoever is tailing the output
        out.flush().await.map_err(|e| PersistError::Transport(e.to_string()))
    }
}

impl<W: AsyncWrite + Unpin + Send> TripPersistence for JsonLinesJournal<W> {
    fn persist<'a>(
        &'a self,
        update: &'a TripUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistError>> + Send + 'a>> {
        Box::pin(self.append(update))
    }
}
