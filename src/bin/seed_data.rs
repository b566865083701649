//! Seed data script - populates the database with demo CRM data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 3 customer segments
//! - 24 customers with spread out registration and purchase dates
//! - 8 catalog products with sales volume text and price history
//! - orders for every customer who has purchased
//! - unscored reviews for the sentiment job

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::Set;
use tracing::info;
use uuid::Uuid;

use bi_crm::{
    config,
    entities::{customer, order, order_item, price_history::Platform, product, review},
    repositories::{CustomerRepository, OrderRepository, ProductRepository, ReviewRepository},
    services::NewCustomer,
    AppState,
};

const FIRST_NAMES: [&str; 8] = ["Asha", "Ravi", "Meera", "Karan", "Neha", "Vikram", "Priya", "Arjun"];
const LAST_NAMES: [&str; 3] = ["Sharma", "Iyer", "Patel"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);

    info!("=== bi-crm seed data ===");
    let state = AppState::connect(config)
        .await
        .context("failed to open database")?;

    let existing = state.customer_service().list_customers().await?;
    if !existing.is_empty() {
        info!(customers = existing.len(), "database already seeded; nothing to do");
        return Ok(());
    }

    let today = Utc::now().date_naive();

    info!("Creating products...");
    let products = create_products(&state).await?;
    info!("  Created {} products", products.len());

    info!("Creating customers...");
    let customers = create_customers(&state, today).await?;
    info!("  Created {} customers", customers.len());

    info!("Creating orders...");
    let order_count = create_orders(&state, &customers, &products).await?;
    info!("  Created {} orders with items", order_count);

    info!("Creating reviews...");
    let review_count = create_reviews(&state, &customers, &products).await?;
    info!("  Created {} reviews", review_count);

    info!("=== Seed data complete ===");
    info!("Try:");
    info!("  bi-crm churn init");
    info!("  bi-crm churn update");
    info!("  bi-crm forecast run");
    info!("  bi-crm reviews score");

    Ok(())
}

async fn create_products(state: &AppState) -> anyhow::Result<Vec<product::Model>> {
    // (name, asin, price, rating, ratings, best seller, sales volume, customers say)
    let products_data = [
        ("Wireless Earbuds", "B09QXCWLNS", dec!(1499.00), 4.1, 18234, true,
         Some("10K+ bought in past month"), Some("Customers like the sound quality and battery life. Some find the fit uncomfortable.")),
        ("Smart Fitness Band", "B07L9FW9GF", dec!(2299.00), 4.0, 9120, false,
         Some("5K+ bought in past month"), Some("Customers find it accurate and good value, but the strap is flimsy.")),
        ("Bluetooth Speaker", "B0CG13FJ5M", dec!(1799.00), 4.4, 4311, true,
         Some("2K+ bought in past month"), Some("Excellent bass and great build quality.")),
        ("USB-C Charger 65W", "B0B296NTFV", dec!(1199.00), 4.3, 2210, false,
         Some("1K+ bought in past month"), Some("Fast charging and reliable.")),
        ("Mechanical Keyboard", "B0CGCZHGW1", dec!(3499.00), 3.9, 870, false,
         Some("500+ bought in past month"), Some("Customers say the keys are noisy and the software is poor.")),
        ("Laptop Stand", "B09KBJK9LK", dec!(899.00), 4.2, 1530, false,
         None, Some("Sturdy and easy to adjust.")),
        ("Webcam 1080p", "B0BYDYJLZR", dec!(2599.00), 3.6, 640, false,
         Some("300 bought"), Some("Picture is blurry in low light and the microphone is bad.")),
        ("Power Bank 20000mAh", "B0C9TJ1ZW2", dec!(1699.00), 4.5, 12650, true,
         Some("3K+ bought in past month"), None),
    ];

    let repo = ProductRepository::new(state.db.clone());
    let mut created = Vec::with_capacity(products_data.len());

    for (name, asin, price, rating, num_ratings, best_seller, sales_volume, customers_say) in products_data {
        let model = repo
            .create(product::ActiveModel {
                name: Set(name.to_string()),
                asin: Set(Some(asin.to_string())),
                category: Set(Some("Electronics".to_string())),
                price: Set(Some(price)),
                original_price: Set(Some(format!("₹{}", (price * dec!(1.2)).round_dp(2)))),
                currency: Set(Some("INR".to_string())),
                country: Set(Some("IN".to_string())),
                rating: Set(Some(rating)),
                product_num_ratings: Set(Some(num_ratings)),
                is_best_seller: Set(best_seller),
                sales_volume: Set(sales_volume.map(str::to_string)),
                customers_say: Set(customers_say.map(str::to_string)),
                ..Default::default()
            })
            .await?;

        // A few older observations so pricing trends have something to average
        for markup in [dec!(1.10), dec!(1.05), Decimal::ONE] {
            repo.append_price(model.id, Platform::Amazon, (price * markup).round_dp(2))
                .await?;
        }
        created.push(model);
    }

    Ok(created)
}

async fn create_customers(state: &AppState, today: NaiveDate) -> anyhow::Result<Vec<customer::Model>> {
    let service = state.customer_service();
    let repo = CustomerRepository::new(state.db.clone());

    let mut segments = Vec::new();
    for (name, description) in [
        ("Loyal", "Frequent buyers with recent purchases"),
        ("Occasional", "Buy a few times a year"),
        ("Dormant", "No purchase in over six months"),
    ] {
        segments.push(repo.create_segment(name, Some(description)).await?);
    }

    let mut created = Vec::new();
    for i in 0..24usize {
        let first_name = FIRST_NAMES[i % FIRST_NAMES.len()];
        let last_name = LAST_NAMES[i % LAST_NAMES.len()];
        let tenure_days = 60 + (i as i64 * 53) % 1_400;

        // Every fifth customer never purchased; the rest spread from days to years ago
        let last_purchase_date = if i % 5 == 4 {
            None
        } else {
            let gap = (i as i64 * 37) % tenure_days.min(700);
            Some(today - Duration::days(gap))
        };
        let segment = match last_purchase_date.map(|d| (today - d).num_days()) {
            Some(gap) if gap <= 60 => &segments[0],
            Some(gap) if gap <= 180 => &segments[1],
            _ => &segments[2],
        };

        let model = service
            .create_customer(NewCustomer {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!(
                    "{}.{}{}@example.com",
                    first_name.to_lowercase(),
                    last_name.to_lowercase(),
                    i
                ),
                phone: Some(format!("+91-98000-{:05}", i)),
                registration_date: Some(today - Duration::days(tenure_days)),
                last_purchase_date,
                segment_id: Some(segment.id),
                spending_factor: None,
            })
            .await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_orders(
    state: &AppState,
    customers: &[customer::Model],
    products: &[product::Model],
) -> anyhow::Result<usize> {
    let repo = OrderRepository::new(state.db.clone());
    let statuses = [
        order::OrderStatus::Completed,
        order::OrderStatus::Completed,
        order::OrderStatus::Pending,
        order::OrderStatus::Cancelled,
    ];
    let mut count = 0;

    for (i, customer) in customers.iter().enumerate() {
        let Some(purchased_on) = customer.last_purchase_date else {
            continue;
        };

        let picks: Vec<&product::Model> = products
            .iter()
            .skip(i % products.len())
            .take(1 + i % 3)
            .collect();
        let total: Decimal = picks
            .iter()
            .filter_map(|p| p.price)
            .sum::<Decimal>()
            * customer.spending_factor;

        let order = repo
            .create(order::ActiveModel {
                order_number: Set(format!("ORD-{:05}", 1000 + i)),
                customer_id: Set(customer.id),
                order_date: Set(purchased_on.and_hms_opt(10, 0, 0).unwrap_or_default().and_utc()),
                total_amount: Set(total.round_dp(2)),
                status: Set(statuses[i % statuses.len()].to_string()),
                ..Default::default()
            })
            .await?;

        for product in picks {
            repo.add_item(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(product.id),
                quantity: Set(1),
                price_at_purchase: Set(product.price.unwrap_or_default()),
            })
            .await?;
        }
        count += 1;
    }

    Ok(count)
}

async fn create_reviews(
    state: &AppState,
    customers: &[customer::Model],
    products: &[product::Model],
) -> anyhow::Result<usize> {
    let comments = [
        (5, "Excellent product, works great"),
        (4, "Good value for the price"),
        (2, "Not good, stopped working after a week"),
        (1, "Terrible quality and poor support"),
        (3, "Okay but the battery is disappointing"),
    ];
    let repo = ReviewRepository::new(state.db.clone());
    let now = Utc::now();
    let mut count = 0;

    for (i, customer) in customers.iter().enumerate().step_by(2) {
        let product = &products[i % products.len()];
        let (rating, comment) = comments[i % comments.len()];
        repo.create(review::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            product_id: Set(product.id),
            rating: Set(rating),
            comment: Set(Some(comment.to_string())),
            review_date: Set(now - Duration::days(i as i64)),
            sentiment_score: Set(None),
        })
        .await?;
        count += 1;
    }

    Ok(count)
}
