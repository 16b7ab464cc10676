use anyhow::Context;
use opentelemetry::{global, trace::TracerProvider};
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, SERVICE_NAME};

/// OTLP providers kept alive for the life of the process.
pub struct Providers {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
}

impl Providers {
    /// Exporters read their endpoint from the standard
    /// `OTEL_EXPORTER_OTLP_*` variables.
    fn otlp() -> anyhow::Result<Self> {
        let resource = Resource::builder().with_service_name(SERVICE_NAME).build();

        let spans = SpanExporter::builder()
            .with_tonic()
            .build()
            .context("Failed to create OTLP span exporter")?;
        let metrics = MetricExporter::builder()
            .with_tonic()
            .build()
            .context("Failed to create OTLP metric exporter")?;

        Ok(Self {
            tracer: SdkTracerProvider::builder()
                .with_batch_exporter(spans)
                .with_resource(resource.clone())
                .build(),
            meter: SdkMeterProvider::builder()
                .with_periodic_exporter(metrics)
                .with_resource(resource)
                .build(),
        })
    }

    /// Flushes pending spans and metrics.
    pub fn shutdown(self) {
        if let Err(err) = self.tracer.shutdown() {
            tracing::warn!(error = %err, "Failed to shut down tracer provider");
        }
        if let Err(err) = self.meter.shutdown() {
            tracing::warn!(error = %err, "Failed to shut down meter provider");
        }
    }
}

/// Installs the global `tracing` subscriber. When OTLP export is enabled the
/// providers are returned so `main` can flush them on shutdown.
pub fn init_telemetry(config: &Config) -> anyhow::Result<Option<Providers>> {
    let providers = config.otlp_enabled.then(Providers::otlp).transpose()?;

    let otel_layer = providers.as_ref().map(|providers| {
        global::set_meter_provider(providers.meter.clone());
        let tracer = providers.tracer.tracer(SERVICE_NAME);
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    let fmt_layer = tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Ok(providers)
}
