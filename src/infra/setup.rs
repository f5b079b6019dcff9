use crate::{
    adapters::persistence::KvPersistence,
    application::ports::{kv_store::KvStore, settlement::SettlementGateway},
    infra::{
        config::{AppConfig, StoreBackend},
        error::InfraError,
        memory_store::MemoryKvStore,
        redis_store::RedisKvStore,
        stub_settlement::StubSettlementGateway,
    },
    use_cases::{
        customer::{CustomerRepo, CustomerUseCases},
        invoice_generation::{InvoiceGenerationUseCases, InvoiceRepo},
        payment::{PaymentRepo, PaymentUseCases},
        plan_catalog::{PlanCatalogUseCases, PlanRepo},
        schedule::{GenerationSchedule, ScheduleRepo},
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Every use case, wired over one persistence handle.
#[derive(Clone)]
pub struct BillingServices {
    pub plans: Arc<PlanCatalogUseCases>,
    pub customers: Arc<CustomerUseCases>,
    pub generator: Arc<InvoiceGenerationUseCases>,
    pub payments: Arc<PaymentUseCases>,
    pub schedule: GenerationSchedule,
}

impl BillingServices {
    pub fn new(
        persistence: Arc<KvPersistence>,
        gateway: Arc<dyn SettlementGateway>,
        max_payment_retries: u32,
    ) -> Self {
        let plan_repo = persistence.clone() as Arc<dyn PlanRepo>;
        let customer_repo = persistence.clone() as Arc<dyn CustomerRepo>;
        let invoice_repo = persistence.clone() as Arc<dyn InvoiceRepo>;
        let payment_repo = persistence.clone() as Arc<dyn PaymentRepo>;
        let schedule = GenerationSchedule::new(persistence as Arc<dyn ScheduleRepo>);

        let plans = PlanCatalogUseCases::new(plan_repo.clone());
        let customers = CustomerUseCases::new(
            customer_repo.clone(),
            plan_repo.clone(),
            invoice_repo.clone(),
            schedule.clone(),
        );
        let generator = InvoiceGenerationUseCases::new(
            customer_repo,
            plan_repo,
            invoice_repo.clone(),
            schedule.clone(),
        );
        let payments = PaymentUseCases::new(invoice_repo, payment_repo, gateway, max_payment_retries);

        Self {
            plans: Arc::new(plans),
            customers: Arc::new(customers),
            generator: Arc::new(generator),
            payments: Arc::new(payments),
            schedule,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: BillingServices,
}

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn KvStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(RedisKvStore::new(&config.redis_url).await?),
        StoreBackend::Memory => Arc::new(MemoryKvStore::new()),
    };
    info!(
        backend = ?config.store_backend,
        key_format = %config.schedule_key_format,
        "store initialized"
    );

    let persistence = Arc::new(KvPersistence::new(store, config.schedule_key_format));
    let services = BillingServices::new(
        persistence,
        Arc::new(StubSettlementGateway::new()),
        config.max_payment_retries,
    );

    Ok(AppState {
        config: Arc::new(config),
        services,
    })
}

pub fn init_tracing(config: &AppConfig) -> Result<(), InfraError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "billing_engine=info".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let json_layer = match &config.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| InfraError::LogFile {
                path: path.display().to_string(),
                source,
            })?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
    Ok(())
}
