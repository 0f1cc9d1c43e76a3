//! Unit tests for the Odoo client.

mod invoices_tests;
mod partners_tests;
