//! Wire types for the DonorConnect REST API.
//!
//! Response shapes are private DTOs converted into `donor-core` types;
//! request bodies and query builders are public.

mod auth;
mod centers;
pub mod common;
mod locations;
mod pledges;
mod requests;
mod users;

pub use auth::LoginResponse;
pub use common::{list_items, single_item, IdValue, NamedRef};
pub use pledges::{NewPledge, PledgeQuery, PledgeUpdate};
pub use requests::RequestQuery;
pub use users::UserQuery;

pub(crate) use auth::{LoginDto, LoginRequest};
pub(crate) use centers::{CenterDto, SubscribeRequest, SubscriptionDto};
pub(crate) use locations::{CommuneDto, WilayaDto};
pub(crate) use pledges::PledgeDto;
pub(crate) use requests::RequestDto;
pub(crate) use users::UserDto;
