mod auth;
mod checkout;
mod helpers;
mod mocks;
mod plans_and_profile;
mod verify;
mod webhook;
