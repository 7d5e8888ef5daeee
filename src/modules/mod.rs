pub mod auth;
pub mod blogs;
pub mod careers;
pub mod contact;
pub mod dashboard;
pub mod destinations;
pub mod itineraries;
pub mod leads;
pub mod packages;
pub mod subscribers;
pub mod tailored;
pub mod testimonials;
pub mod users;

use tripdesk_kernel::ModuleRegistry;

use crate::context::AppContext;

/// Register every module with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &AppContext) {
    registry.register_core(auth::create_module(ctx));
    registry.register_core(users::create_module(ctx));

    registry.register_custom(packages::create_module(ctx));
    registry.register_custom(destinations::create_module(ctx));
    registry.register_custom(blogs::create_module(ctx));
    registry.register_custom(leads::create_module(ctx));
    registry.register_custom(contact::create_module(ctx));
    registry.register_custom(subscribers::create_module(ctx));
    registry.register_custom(testimonials::create_module(ctx));
    registry.register_custom(careers::create_module(ctx));
    registry.register_custom(itineraries::create_module(ctx));
    registry.register_custom(tailored::create_module(ctx));
    registry.register_custom(dashboard::create_module(ctx));
}
