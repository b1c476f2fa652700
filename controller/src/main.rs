mod check;
mod dispatch;
mod error;
mod host;
mod ifttt;
mod secrets;
mod sensorpush;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
