//! Demo accounts and catalog.

use rust_decimal::Decimal;
use tracing::info;

use crate::auth::hash_password;
use crate::domain::{NewProduct, NewUser, ProductFilter, UserRole};
use crate::error::Result;
use crate::store::Store;

pub const ADMIN_EMAIL: &str = "admin@qalab.hu";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const USER_EMAIL: &str = "user@qalab.hu";
pub const USER_PASSWORD: &str = "user123";

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    /// Price in cents.
    price: i64,
    category: &'static str,
    in_stock: bool,
    rating: f64,
    review_count: i32,
    image: &'static str,
}

const CATALOG: [DemoProduct; 8] = [
    DemoProduct {
        name: "Bug Hunter Pro 3000",
        description: "The ultimate bug hunting toolkit. Guaranteed to find every bug... or at least most of them.",
        price: 29999,
        category: "Software",
        in_stock: true,
        rating: 4.8,
        review_count: 127,
        image: "/uploads/free_ai_bug_hunter_pro_3000.svg",
    },
    DemoProduct {
        name: "Coffee-to-Code Converter v2.1",
        description: "Turns coffee into working code automatically. Accepts latte art as input.",
        price: 129999,
        category: "Hardware",
        in_stock: true,
        rating: 4.2,
        review_count: 89,
        image: "/uploads/free_ai_coffee_to_code_converter_v2_1.svg",
    },
    DemoProduct {
        name: "Stack Overflow Subscription Premium",
        description: "Unlimited copy-paste plus premium \"works on my machine\" answers.",
        price: 7999,
        category: "Subscription",
        in_stock: true,
        rating: 4.9,
        review_count: 342,
        image: "/uploads/free_ai_stack_overflow_subscription_premium.svg",
    },
    DemoProduct {
        name: "Rubber Duck Debugger Enterprise",
        description: "A professional rubber duck for pair debugging. Listens, nods and never judges.",
        price: 19999,
        category: "Hardware",
        in_stock: false,
        rating: 4.5,
        review_count: 203,
        image: "/uploads/free_ai_rubber_duck_debugger_enterprise.svg",
    },
    DemoProduct {
        name: "Ctrl+Z Time Machine",
        description: "A real undo for life. Works on deleted code, sent emails and bad decisions.",
        price: 179999,
        category: "Hardware",
        in_stock: true,
        rating: 3.7,
        review_count: 156,
        image: "/uploads/free_ai_ctrl_z_time_machine.svg",
    },
    DemoProduct {
        name: "Lorem Ipsum Generator Deluxe",
        description: "Endless placeholder text for every occasion. Now with sentences that make sense!",
        price: 5999,
        category: "Software",
        in_stock: true,
        rating: 4.1,
        review_count: 278,
        image: "/uploads/free_ai_lorem_ipsum_generator_deluxe.svg",
    },
    DemoProduct {
        name: "Infinite Loop Detector",
        description: "Stops infinite loops before your computer starts to smoke.",
        price: 34999,
        category: "Software",
        in_stock: true,
        rating: 4.6,
        review_count: 94,
        image: "/uploads/free_ai_infinite_loop_detector.svg",
    },
    DemoProduct {
        name: "Semicolon Recovery Kit",
        description: "Emergency supplies for missing semicolons. Has saved more than one career.",
        price: 9999,
        category: "Emergency Kit",
        in_stock: false,
        rating: 3.9,
        review_count: 187,
        image: "/uploads/free_ai_semicolon_recovery_kit.svg",
    },
];

const IN_STOCK_UNITS: i32 = 25;

/// Creates the demo admin and user if absent, and the demo catalog if the
/// catalog is empty. Safe to run on every start.
pub async fn run(store: &dyn Store) -> Result<()> {
    for (name, email, password, role) in [
        ("Admin User", ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin),
        ("Test User", USER_EMAIL, USER_PASSWORD, UserRole::User),
    ] {
        if store.find_user_by_email(email).await?.is_some() {
            continue;
        }
        let password_hash = hash_password(password)?;
        store
            .insert_user(NewUser { name: name.to_string(), email: email.to_string(), password_hash, role })
            .await?;
        info!(%email, ?role, "seeded user");
    }

    if !store.list_products(&ProductFilter::default()).await?.is_empty() {
        info!("catalog already populated, skipping demo products");
        return Ok(());
    }
    for demo in &CATALOG {
        store
            .insert_product(NewProduct {
                name: demo.name.to_string(),
                description: demo.description.to_string(),
                price: Decimal::new(demo.price, 2),
                category: demo.category.to_string(),
                stock: if demo.in_stock { IN_STOCK_UNITS } else { 0 },
                in_stock: demo.in_stock,
                image: Some(demo.image.to_string()),
                rating: demo.rating,
                review_count: demo.review_count,
            })
            .await?;
    }
    info!(count = CATALOG.len(), "seeded demo catalog");
    Ok(())
}
