pub mod generate_sql;
