mod entries;
mod health_check;
