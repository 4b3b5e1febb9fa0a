/*!
# Sustainability Metrics Tracker

A web service for tracking yearly environmental metrics, built in Rust.

## Overview

Authenticated users submit yearly sustainability figures — carbon emissions,
water usage, waste generated, energy consumption — and read them back as
chart-ready series compared against fixed industry benchmarks, with export
to spreadsheet or JSON.

## Architecture

The service follows a client-server split over a small JSON REST contract:

### Server side
- **Technologies**: Rust, axum
- **Core Components**:
  - Metric Store Reconciler - Upserts one record per (user, year) from batch
    submissions, all-or-nothing
  - User Store - Registration and login with Argon2 password hashing
  - Session Layer - Opaque bearer tokens with in-memory session tracking
  - Export Engine - XLSX and JSON downloads of the dense series

### Aggregation layer
- **Metric Grid** - A sparse (year x metric) value table that accumulates raw
  form edits, shapes them into dense per-year records, gates submission on
  completeness, and computes benchmark-relative performance percentages

### Data Persistence Layer
- JSON document files (users, metrics) under a configurable data directory
- No record is ever deleted; submissions for an existing (user, year) replace
  its metric fields in place

## Modules

- **metrics**: Metric records, batch validation, and the upsert-by-year store
- **grid**: The sparse metric grid, dense-series shaping, benchmark math
- **login**: User registration, login, sessions, bearer-token middleware
- **export**: XLSX/JSON export of the dense series
- **config**: Reporting years, benchmarks, and server environment settings
- **app**: Routing, middleware, and request handlers

## REST API Endpoints

- `POST /api/users/register` - Create an account
- `POST /api/users/login` - Log in, receiving a bearer token
- `POST /api/metrics/create` - Submit a batch of yearly metrics (upsert)
- `GET /api/metrics/get` - Retrieve the caller's records
- `GET /api/metrics/export?format=xlsx|json` - Download the dense series
*/

pub mod app;
pub mod config;
pub mod export;
pub mod grid;
pub mod login;
pub mod metrics;

/// Re-export everything from these modules to make it easier to use
pub use config::*;
pub use export::*;
pub use grid::*;
pub use login::*;
pub use metrics::*;
